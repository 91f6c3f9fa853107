//! Builds one narrated, captioned scene clip.
//!
//! Steps, in order: resolve the voice, synthesize narration, fix the scene
//! duration (explicit or measured), segment captions, acquire the visual,
//! then composite everything into `scene_NNN.mp4`.

use std::path::{Path, PathBuf};

use tracing::debug;

use narrato_media::SceneRenderSettings;
use narrato_models::{
    segment_captions, CaptionError, GenreProfile, SceneClip, SceneInput, VisualKind, VisualSource,
    VisualTrack,
};

use crate::error::{WorkerError, WorkerResult};
use crate::processor::ProcessingContext;

/// Candidate clips requested from the stock-footage search.
pub const STOCK_SEARCH_LIMIT: u32 = 10;

/// A composited scene and where it was written.
#[derive(Debug, Clone)]
pub struct BuiltScene {
    pub clip: SceneClip,
    pub path: PathBuf,
}

/// Build scene `index` of a task inside `work_dir`.
pub async fn build_scene(
    ctx: &ProcessingContext,
    profile: &GenreProfile,
    settings: &SceneRenderSettings,
    language: &str,
    index: usize,
    input: &SceneInput,
    work_dir: &Path,
) -> WorkerResult<BuiltScene> {
    if input.text.split_whitespace().next().is_none() {
        return Err(match profile.caption_chunk_size {
            Some(_) => CaptionError::NoPhrases.into(),
            None => WorkerError::invalid_scene(format!("scene {} has no narration", index + 1)),
        });
    }

    let voice_id = profile.voices.resolve(language).ok_or_else(|| {
        WorkerError::config_error(format!(
            "no voice for {language} and no {} fallback voice",
            profile.voices.fallback_language()
        ))
    })?;

    let audio_path = work_dir.join(format!("narration_{index:03}.mp3"));
    ctx.speech
        .synthesize(&input.text, voice_id, &audio_path)
        .await
        .map_err(|e| WorkerError::from_provider("speech synthesis", e))?;

    let duration = match input.duration {
        Some(explicit) => explicit,
        None => ctx
            .renderer
            .probe_duration(&audio_path)
            .await
            .map_err(|e| WorkerError::asset_unavailable(format!("narration audio: {e}")))?,
    };

    let cues = match profile.caption_chunk_size {
        Some(chunk) => segment_captions(&input.text, duration, chunk, profile.min_caption_window())?,
        None if !duration.is_finite() || duration <= 0.0 => {
            return Err(WorkerError::invalid_scene(format!(
                "scene {} duration must be positive, got {duration}",
                index + 1
            )));
        }
        None => Vec::new(),
    };
    debug!(scene = index, duration, cues = cues.len(), voice = voice_id, "Scene timing fixed");

    let visual = acquire_visual(ctx, profile.visual, &input.visual, duration, index, work_dir).await?;

    let clip = SceneClip {
        visual,
        audio_path,
        duration,
        cues,
    };

    let caption_dir = work_dir.join(format!("captions_{index:03}"));
    tokio::fs::create_dir_all(&caption_dir).await?;
    let output = work_dir.join(format!("scene_{index:03}.mp4"));
    ctx.renderer
        .compose_scene(&clip, settings, &caption_dir, &output)
        .await
        .map_err(WorkerError::from_media)?;

    Ok(BuiltScene { clip, path: output })
}

/// Resolve a scene's visual reference into a local track.
async fn acquire_visual(
    ctx: &ProcessingContext,
    source: VisualSource,
    reference: &str,
    duration: f64,
    index: usize,
    work_dir: &Path,
) -> WorkerResult<VisualTrack> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(WorkerError::invalid_scene(format!(
            "scene {} has no visual reference",
            index + 1
        )));
    }

    match source {
        VisualSource::ImageReference if is_remote(reference) => {
            let ext = remote_extension(reference).unwrap_or_else(|| "jpg".to_string());
            let dest = work_dir.join(format!("visual_{index:03}.{ext}"));
            fetch(ctx, reference, &dest).await?;
            Ok(VisualTrack {
                kind: VisualKind::from_path(&dest),
                path: dest,
            })
        }
        VisualSource::ImageReference => {
            let path = PathBuf::from(reference);
            if !path.is_file() {
                return Err(WorkerError::asset_unavailable(format!(
                    "visual not found: {reference}"
                )));
            }
            Ok(VisualTrack {
                kind: VisualKind::from_path(&path),
                path,
            })
        }
        VisualSource::ImagePrompt => {
            let images = ctx
                .images
                .as_ref()
                .ok_or_else(|| WorkerError::config_error("image generation is not configured"))?;
            let url = images
                .generate(reference)
                .await
                .map_err(|e| WorkerError::from_provider("image generation", e))?;
            let dest = work_dir.join(format!("visual_{index:03}.jpg"));
            fetch(ctx, &url, &dest).await?;
            Ok(VisualTrack::image(dest))
        }
        VisualSource::StockVideoSearch => {
            let url = ctx
                .stock
                .search(reference, STOCK_SEARCH_LIMIT, duration)
                .await
                .map_err(|e| WorkerError::from_provider("stock footage search", e))?;
            let dest = work_dir.join(format!("visual_{index:03}.mp4"));
            fetch(ctx, &url, &dest).await?;
            Ok(VisualTrack::video(dest))
        }
    }
}

async fn fetch(ctx: &ProcessingContext, url: &str, dest: &Path) -> WorkerResult<()> {
    ctx.fetcher
        .fetch(url, dest)
        .await
        .map_err(|e| WorkerError::from_provider("download", e))
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Lowercased file extension of a URL path, ignoring query and fragment.
fn remote_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    let valid = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}
