//! Media operations the pipeline depends on.

use std::path::Path;

use async_trait::async_trait;

use narrato_media::{FfmpegRunner, MediaResult, SceneRenderSettings};
use narrato_models::{EncodingConfig, SceneClip, Timeline};

/// Probing, scene composition and timeline assembly.
#[async_trait]
pub trait MediaRenderer: Send + Sync {
    /// Duration of a media file in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    async fn compose_scene(
        &self,
        clip: &SceneClip,
        settings: &SceneRenderSettings,
        work_dir: &Path,
        output: &Path,
    ) -> MediaResult<()>;

    async fn assemble(
        &self,
        timeline: &Timeline,
        encoding: &EncodingConfig,
        work_dir: &Path,
        output: &Path,
    ) -> MediaResult<()>;
}

/// [`MediaRenderer`] backed by the FFmpeg and FFprobe CLIs.
#[derive(Clone, Default)]
pub struct FfmpegRenderer {
    runner: FfmpegRunner,
}

impl FfmpegRenderer {
    /// `runner` carries the timeout and shutdown channel for every invocation.
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl MediaRenderer for FfmpegRenderer {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        narrato_media::probe_duration(path).await
    }

    async fn compose_scene(
        &self,
        clip: &SceneClip,
        settings: &SceneRenderSettings,
        work_dir: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        narrato_media::compose_scene(clip, settings, work_dir, output, &self.runner).await
    }

    async fn assemble(
        &self,
        timeline: &Timeline,
        encoding: &EncodingConfig,
        work_dir: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        narrato_media::assemble_timeline(timeline, encoding, work_dir, output, &self.runner).await
    }
}
