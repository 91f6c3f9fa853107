//! In-memory collaborators for router tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use axum::Router;

use narrato_models::{Genre, Story, StoryScene};
use narrato_providers::{
    ImageGenerator, ProviderError, ProviderResult, SpeechSynthesizer, StockFootage, StoryWriter,
};
use narrato_queue::{JobDispatcher, MemoryStatusStore, QueueError, QueueResult, RenderVideoJob};
use narrato_storage::MemoryAssetStore;

use crate::config::ApiConfig;
use crate::routes::create_router;
use crate::state::AppState;

/// Records every dispatched job; can be told to fail the next dispatch.
#[derive(Default)]
pub struct RecordingDispatcher {
    jobs: Mutex<Vec<RenderVideoJob>>,
    fail: Mutex<bool>,
}

impl RecordingDispatcher {
    pub fn jobs(&self) -> Vec<RenderVideoJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl JobDispatcher for RecordingDispatcher {
    async fn dispatch(&self, job: RenderVideoJob) -> QueueResult<String> {
        self.jobs.lock().unwrap().push(job);
        let mut fail = self.fail.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(QueueError::connection_failed("redis unavailable"));
        }
        Ok("1-0".to_string())
    }
}

pub struct FakeStory;

#[async_trait]
impl StoryWriter for FakeStory {
    async fn write_story(&self, genre: Genre, topic: &str, _language: &str) -> ProviderResult<Story> {
        let sentences = format!("A story about {}.", topic);
        Ok(Story {
            scenes: vec![StoryScene {
                sentences: sentences.clone(),
                visual_prompt: format!("{}: {}", genre, topic),
            }],
            complete_story: sentences,
        })
    }
}

/// Writes a few bytes and remembers `(voice, path)` of the last call.
#[derive(Default)]
pub struct FakeSpeech {
    last: Mutex<Option<(String, String)>>,
}

impl FakeSpeech {
    pub fn last_call(&self) -> Option<(String, String)> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _text: &str, voice_id: &str, dest: &Path) -> ProviderResult<()> {
        tokio::fs::write(dest, b"ID3fake").await?;
        *self.last.lock().unwrap() = Some((voice_id.to_string(), dest.display().to_string()));
        Ok(())
    }
}

pub struct FakeImages;

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        Ok(format!("https://images.test/{}.jpg", prompt))
    }
}

/// Answers every query except "nothing"; records `(query, limit, min_duration)`.
#[derive(Default)]
pub struct FakeStock {
    calls: Mutex<Vec<(String, u32, f64)>>,
}

impl FakeStock {
    pub fn calls(&self) -> Vec<(String, u32, f64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StockFootage for FakeStock {
    async fn search(&self, query: &str, limit: u32, min_duration: f64) -> ProviderResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), limit, min_duration));
        if query == "nothing" {
            return Err(ProviderError::NoResults(format!("No videos found for '{}'", query)));
        }
        Ok(format!("https://stock.test/{}.mp4", query))
    }
}

pub struct TestApp {
    pub router: Router,
    pub status: Arc<MemoryStatusStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub storage: Arc<MemoryAssetStore>,
    pub speech: Arc<FakeSpeech>,
    pub stock: Arc<FakeStock>,
}

pub fn test_app() -> TestApp {
    let status = Arc::new(MemoryStatusStore::new());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let storage = Arc::new(MemoryAssetStore::new("https://cdn.test"));
    let speech = Arc::new(FakeSpeech::default());
    let stock = Arc::new(FakeStock::default());

    let state = AppState {
        config: ApiConfig::default(),
        status: status.clone(),
        dispatcher: dispatcher.clone(),
        storage: storage.clone(),
        story: Arc::new(FakeStory),
        speech: speech.clone(),
        images: Arc::new(FakeImages),
        stock: stock.clone(),
    };

    TestApp {
        router: create_router(state, None),
        status,
        dispatcher,
        storage,
        speech,
        stock,
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
