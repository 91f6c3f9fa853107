//! Task processing: scenes in order, timeline assembly, upload, status.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{warn, Instrument};

use narrato_media::{CaptionStyle, FfmpegRunner, SceneRenderSettings};
use narrato_models::{EncodingConfig, MusicBed, TaskRecord, Timeline};
use narrato_providers::{
    AssetFetcher, ElevenLabsClient, HttpFetcher, ImageGenerator, PexelsClient, ProviderConfig,
    ReplicateClient, SpeechSynthesizer, StockFootage,
};
use narrato_queue::{QueueConfig, RedisStatusStore, RenderVideoJob, StatusStore};
use narrato_storage::{AssetKind, AssetStore, S3AssetStore};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::renderer::{FfmpegRenderer, MediaRenderer};
use crate::scene_builder::build_scene;

/// Everything a task needs, injected once at startup.
#[derive(Clone)]
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub status: Arc<dyn StatusStore>,
    pub storage: Arc<dyn AssetStore>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub stock: Arc<dyn StockFootage>,
    /// Only needed for prompt-driven visuals
    pub images: Option<Arc<dyn ImageGenerator>>,
    pub fetcher: Arc<dyn AssetFetcher>,
    pub renderer: Arc<dyn MediaRenderer>,
}

impl ProcessingContext {
    /// Build production clients from the environment.
    ///
    /// FFmpeg invocations are killed when `shutdown` flips to `true`.
    pub fn from_env(
        config: WorkerConfig,
        queue_config: &QueueConfig,
        shutdown: watch::Receiver<bool>,
    ) -> WorkerResult<Self> {
        let providers = ProviderConfig::from_env();
        let provider_err = |e: narrato_providers::ProviderError| WorkerError::config_error(e.to_string());

        let status = RedisStatusStore::new(&queue_config.redis_url, queue_config.status_ttl.as_secs())?;
        let storage = S3AssetStore::from_env().map_err(|e| WorkerError::config_error(e.to_string()))?;
        let speech = ElevenLabsClient::new(&providers).map_err(provider_err)?;
        let stock = PexelsClient::new(&providers).map_err(provider_err)?;
        let fetcher = HttpFetcher::new(&providers).map_err(provider_err)?;
        let images = match ReplicateClient::new(&providers) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn ImageGenerator>),
            Err(e) => {
                warn!("Image generation disabled: {}", e);
                None
            }
        };

        let runner = FfmpegRunner::new()
            .with_timeout(config.ffmpeg_timeout.as_secs())
            .with_cancel(shutdown);

        Ok(Self {
            config,
            status: Arc::new(status),
            storage: Arc::new(storage),
            speech: Arc::new(speech),
            stock: Arc::new(stock),
            images,
            fetcher: Arc::new(fetcher),
            renderer: Arc::new(FfmpegRenderer::new(runner)),
        })
    }
}

/// What happened to a delivered job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The task was already terminal; nothing ran
    Skipped(TaskRecord),
    /// The task ran and this record was written
    Finished(TaskRecord),
}

/// Run a delivered job at most once and record its terminal status.
///
/// Returns an error only when the status could not be read or written; the
/// message should then stay pending so it is claimed again later.
pub async fn process_job(
    ctx: &ProcessingContext,
    job: &RenderVideoJob,
    shutdown: watch::Receiver<bool>,
) -> WorkerResult<JobOutcome> {
    let current = ctx.status.get_status(&job.task_id).await?;
    if current.is_terminal() {
        warn!("Task {} is already {}, skipping", job.task_id, current.status);
        metrics::record_task_skipped();
        return Ok(JobOutcome::Skipped(current));
    }

    let logger = JobLogger::new(&job.task_id, &format!("render_{}", job.genre));
    let span = logger.create_span();
    let started = Instant::now();
    let timeout = ctx.config.job_timeout;

    let result = async {
        logger.log_start(&format!("{} scenes, language {}", job.scenes.len(), job.language));
        tokio::select! {
            result = tokio::time::timeout(timeout, run_task(ctx, job, &logger)) => {
                result.unwrap_or(Err(WorkerError::Timeout(timeout.as_secs())))
            }
            _ = wait_for_shutdown(shutdown) => Err(WorkerError::Cancelled),
        }
    }
    .instrument(span)
    .await;

    let record = match result {
        Ok(url) => {
            logger.log_completion(&url);
            metrics::record_task_completed(job.genre.as_str(), started.elapsed().as_secs_f64());
            TaskRecord::completed(url)
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            metrics::record_task_failed(job.genre.as_str(), e.kind());
            TaskRecord::failed(e.to_string())
        }
    };

    if !ctx.status.set_status(&job.task_id, &record).await? {
        warn!("Task {} reached a terminal state elsewhere", job.task_id);
        return Ok(JobOutcome::Skipped(ctx.status.get_status(&job.task_id).await?));
    }
    Ok(JobOutcome::Finished(record))
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        // Sender gone: nobody can ask us to stop any more.
        std::future::pending::<()>().await;
    }
}

/// Build every scene in order, assemble the timeline and upload the result.
/// Returns the public URL of the final video.
///
/// All intermediate files live in a temporary directory removed when this
/// returns or is dropped.
pub async fn run_task(
    ctx: &ProcessingContext,
    job: &RenderVideoJob,
    logger: &JobLogger,
) -> WorkerResult<String> {
    if job.scenes.is_empty() {
        return Err(WorkerError::invalid_scene("task has no scenes"));
    }

    let profile = job.genre.profile();
    let genre = job.genre.as_str();

    let music = if profile.include_music {
        if !ctx.config.music_path.is_file() {
            return Err(WorkerError::asset_unavailable(format!(
                "background music not found: {}",
                ctx.config.music_path.display()
            )));
        }
        Some(MusicBed::new(&ctx.config.music_path, profile.music_volume))
    } else {
        None
    };

    tokio::fs::create_dir_all(&ctx.config.work_dir).await?;
    let work_dir = tempfile::Builder::new()
        .prefix("task-")
        .tempdir_in(&ctx.config.work_dir)?;

    let settings = SceneRenderSettings::new(profile.frame_size, profile.scene_fps)
        .with_captions(CaptionStyle::default().with_font(&ctx.config.caption_font_path));

    let total = job.scenes.len();
    let mut timeline = Timeline::new();
    for (index, scene) in job.scenes.iter().enumerate() {
        let started = Instant::now();
        let built = build_scene(
            ctx,
            &profile,
            &settings,
            &job.language,
            index,
            scene,
            work_dir.path(),
        )
        .await?;
        metrics::record_scene_build(genre, started.elapsed().as_secs_f64());
        logger.log_progress(&format!(
            "scene {}/{} ready ({:.2}s, {} captions)",
            index + 1,
            total,
            built.clip.duration,
            built.clip.cues.len()
        ));
        timeline.push(built.path, built.clip.duration);
    }

    if let Some(music) = music {
        timeline = timeline.with_music(music);
    }

    let output = work_dir.path().join("final.mp4");
    let started = Instant::now();
    ctx.renderer
        .assemble(&timeline, &EncodingConfig::default(), work_dir.path(), &output)
        .await
        .map_err(WorkerError::from_media)?;
    metrics::record_timeline_encode(genre, started.elapsed().as_secs_f64());
    logger.log_progress(&format!(
        "timeline encoded ({:.2}s total)",
        timeline.total_duration()
    ));

    let stored = ctx
        .storage
        .upload(&output, AssetKind::Video)
        .await
        .map_err(|e| WorkerError::encoding(format!("upload failed: {e}")))?;

    Ok(stored.url)
}
