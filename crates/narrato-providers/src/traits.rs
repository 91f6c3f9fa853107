//! Seams between the pipeline and the external collaborators.

use std::path::Path;

use async_trait::async_trait;

use narrato_models::{Genre, Story};

use crate::error::ProviderResult;

/// Writes a scene-by-scene story for a topic.
#[async_trait]
pub trait StoryWriter: Send + Sync {
    async fn write_story(&self, genre: Genre, topic: &str, language: &str) -> ProviderResult<Story>;
}

/// Turns narration text into an audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice_id` and write the audio to `dest`.
    async fn synthesize(&self, text: &str, voice_id: &str, dest: &Path) -> ProviderResult<()>;
}

/// Finds stock footage for a search query.
#[async_trait]
pub trait StockFootage: Send + Sync {
    /// URL of a clip matching `query` that lasts at least `min_duration` seconds.
    async fn search(&self, query: &str, limit: u32, min_duration: f64) -> ProviderResult<String>;
}

/// Generates a still image from a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// URL of the generated image.
    async fn generate(&self, prompt: &str) -> ProviderResult<String>;
}

/// Fetches a remote asset to a local file.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> ProviderResult<()>;
}
