//! Application state.

use std::sync::Arc;

use narrato_providers::{
    ElevenLabsClient, ImageGenerator, OpenAiClient, PexelsClient, ProviderConfig,
    ReplicateClient, SpeechSynthesizer, StockFootage, StoryWriter,
};
use narrato_queue::{JobDispatcher, JobQueue, QueueConfig, RedisStatusStore, StatusStore};
use narrato_storage::{AssetStore, S3AssetStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub status: Arc<dyn StatusStore>,
    pub dispatcher: Arc<dyn JobDispatcher>,
    pub storage: Arc<dyn AssetStore>,
    pub story: Arc<dyn StoryWriter>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub images: Arc<dyn ImageGenerator>,
    pub stock: Arc<dyn StockFootage>,
}

impl AppState {
    /// Create application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let queue_config = QueueConfig::from_env();
        let status = RedisStatusStore::new(
            &queue_config.redis_url,
            queue_config.status_ttl.as_secs(),
        )?;
        let queue = JobQueue::new(queue_config)?;
        queue.init().await?;

        let storage = S3AssetStore::from_env()?;

        let providers = ProviderConfig::from_env();
        let story = OpenAiClient::new(&providers)?;
        let speech = ElevenLabsClient::new(&providers)?;
        let images = ReplicateClient::new(&providers)?;
        let stock = PexelsClient::new(&providers)?;

        Ok(Self {
            config,
            status: Arc::new(status),
            dispatcher: Arc::new(queue),
            storage: Arc::new(storage),
            story: Arc::new(story),
            speech: Arc::new(speech),
            images: Arc::new(images),
            stock: Arc::new(stock),
        })
    }
}
