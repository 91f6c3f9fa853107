//! In-process fakes for pipeline tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use narrato_media::{MediaResult, SceneRenderSettings};
use narrato_models::{EncodingConfig, SceneClip, Timeline};
use narrato_providers::{
    AssetFetcher, ProviderError, ProviderResult, SpeechSynthesizer, StockFootage,
};
use narrato_queue::StatusStore;
use narrato_storage::MemoryAssetStore;

use crate::config::WorkerConfig;
use crate::processor::ProcessingContext;
use crate::renderer::MediaRenderer;

pub enum SpeechMode {
    Ok,
    Fail,
    Hang,
}

pub struct FakeSpeech(SpeechMode);

impl FakeSpeech {
    pub fn ok() -> Self {
        Self(SpeechMode::Ok)
    }

    pub fn failing() -> Self {
        Self(SpeechMode::Fail)
    }

    pub fn hanging() -> Self {
        Self(SpeechMode::Hang)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _text: &str, _voice_id: &str, dest: &Path) -> ProviderResult<()> {
        match self.0 {
            SpeechMode::Ok => Ok(tokio::fs::write(dest, b"mp3").await?),
            SpeechMode::Fail => Err(ProviderError::Api {
                service: "elevenlabs",
                status: 500,
                body: "synthesis unavailable".into(),
            }),
            SpeechMode::Hang => std::future::pending().await,
        }
    }
}

pub struct FakeStock;

#[async_trait]
impl StockFootage for FakeStock {
    async fn search(&self, query: &str, _limit: u32, _min_duration: f64) -> ProviderResult<String> {
        Ok(format!("https://stock.test/{}.mp4", query.replace(' ', "-")))
    }
}

pub struct FakeFetcher;

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str, dest: &Path) -> ProviderResult<()> {
        Ok(tokio::fs::write(dest, b"asset").await?)
    }
}

/// Records what it was asked to render and writes placeholder outputs.
pub struct FakeRenderer {
    probed: f64,
    composed: Mutex<Vec<SceneClip>>,
    assembled: Mutex<Option<Timeline>>,
}

impl FakeRenderer {
    pub fn new(probed: f64) -> Self {
        Self {
            probed,
            composed: Mutex::new(Vec::new()),
            assembled: Mutex::new(None),
        }
    }

    pub fn composed(&self) -> Vec<SceneClip> {
        self.composed.lock().unwrap().clone()
    }

    pub fn assembled(&self) -> Option<Timeline> {
        self.assembled.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaRenderer for FakeRenderer {
    async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(self.probed)
    }

    async fn compose_scene(
        &self,
        clip: &SceneClip,
        _settings: &SceneRenderSettings,
        _work_dir: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        self.composed.lock().unwrap().push(clip.clone());
        tokio::fs::write(output, b"scene").await?;
        Ok(())
    }

    async fn assemble(
        &self,
        timeline: &Timeline,
        _encoding: &EncodingConfig,
        _work_dir: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        *self.assembled.lock().unwrap() = Some(timeline.clone());
        tokio::fs::write(output, b"final").await?;
        Ok(())
    }
}

/// Context over fakes rooted at `root`: work dir `root/work`, music
/// `root/music.mp3`, uploads to `https://cdn.test`.
pub fn context(
    root: &Path,
    status: Arc<dyn StatusStore>,
    renderer: Arc<FakeRenderer>,
) -> ProcessingContext {
    let music = root.join("music.mp3");
    std::fs::write(&music, b"music").unwrap();

    let config = WorkerConfig {
        work_dir: root.join("work"),
        music_path: music,
        ..WorkerConfig::default()
    };

    ProcessingContext {
        config,
        status,
        storage: Arc::new(MemoryAssetStore::new("https://cdn.test")),
        speech: Arc::new(FakeSpeech::ok()),
        stock: Arc::new(FakeStock),
        images: None,
        fetcher: Arc::new(FakeFetcher),
        renderer,
    }
}
