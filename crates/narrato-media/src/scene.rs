//! Scene clip composition.
//!
//! A scene is rendered from three layers: the visual (a still image held or a
//! video looped for the scene duration, conformed to the frame size and
//! frame rate), the caption overlays, and the narration audio padded with
//! silence. The output is cut to exactly the scene duration.

use std::path::{Path, PathBuf};
use tracing::info;

use narrato_models::{EncodingConfig, FrameSize, SceneClip, VisualKind};

use crate::command::{format_secs, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::overlay::{caption_filter_chain, write_caption_files, CaptionStyle};

/// Audio sample rate shared by every scene so concat never resamples.
pub const SCENE_SAMPLE_RATE: u32 = 44_100;

/// How scene clips are rendered.
#[derive(Debug, Clone)]
pub struct SceneRenderSettings {
    pub frame_size: FrameSize,
    pub fps: u32,
    pub encoding: EncodingConfig,
    pub captions: CaptionStyle,
}

impl SceneRenderSettings {
    pub fn new(frame_size: FrameSize, fps: u32) -> Self {
        Self {
            frame_size,
            fps,
            encoding: EncodingConfig::for_scene(fps),
            captions: CaptionStyle::default(),
        }
    }

    pub fn with_captions(mut self, captions: CaptionStyle) -> Self {
        self.captions = captions;
        self
    }
}

/// Video filter conforming the visual to the frame size and rate.
fn conform_filter(frame: FrameSize, fps: u32) -> String {
    let (w, h) = (frame.width, frame.height);
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}"
    )
}

/// Build the FFmpeg command for one scene.
///
/// `caption_files` holds one text file per cue of `clip` (empty when the clip
/// has no captions).
pub fn scene_command(
    clip: &SceneClip,
    settings: &SceneRenderSettings,
    caption_files: &[PathBuf],
    output: &Path,
) -> MediaResult<FfmpegCommand> {
    if !(clip.duration.is_finite() && clip.duration > 0.0) {
        return Err(MediaError::invalid_input(format!(
            "scene duration must be positive, got {}",
            clip.duration
        )));
    }
    let duration = format_secs(clip.duration);

    let visual_args: Vec<String> = match clip.visual.kind {
        VisualKind::Image => vec![
            "-loop".into(),
            "1".into(),
            "-framerate".into(),
            settings.fps.to_string(),
            "-t".into(),
            duration.clone(),
        ],
        VisualKind::Video => vec!["-stream_loop".into(), "-1".into(), "-t".into(), duration.clone()],
    };

    let mut video_chain = format!("[0:v]{}", conform_filter(settings.frame_size, settings.fps));
    if !clip.cues.is_empty() {
        video_chain.push(',');
        video_chain.push_str(&caption_filter_chain(&clip.cues, caption_files, &settings.captions)?);
    }
    video_chain.push_str("[v]");

    let filter = format!("{video_chain};[1:a]apad[a]");

    Ok(FfmpegCommand::new(output)
        .input_with_args(visual_args, &clip.visual.path)
        .input(&clip.audio_path)
        .filter_complex(filter)
        .map("[v]")
        .map("[a]")
        .output_args(settings.encoding.to_ffmpeg_args())
        .output_args([
            "-ar".to_string(),
            SCENE_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            "2".to_string(),
        ])
        .duration(clip.duration))
}

/// Render `clip` to `output`, writing caption text files into `work_dir`.
///
/// Caption failures surface as [`MediaError::CaptionRender`] before FFmpeg
/// is started.
pub async fn compose_scene(
    clip: &SceneClip,
    settings: &SceneRenderSettings,
    work_dir: &Path,
    output: &Path,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    for path in [&clip.visual.path, &clip.audio_path] {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.clone()));
        }
    }

    let caption_files = if clip.cues.is_empty() {
        Vec::new()
    } else {
        settings.captions.validate()?;
        write_caption_files(&clip.cues, work_dir).await?
    };

    let cmd = scene_command(clip, settings, &caption_files, output)?;
    runner.run(&cmd).await?;

    info!(
        output = %output.display(),
        duration = clip.duration,
        cues = clip.cues.len(),
        "Composed scene clip"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrato_models::{segment_captions, VisualTrack};

    fn clip(kind: VisualKind, text: &str) -> SceneClip {
        let path = match kind {
            VisualKind::Image => "still.png",
            VisualKind::Video => "footage.mp4",
        };
        SceneClip {
            visual: VisualTrack {
                path: PathBuf::from(path),
                kind,
            },
            audio_path: PathBuf::from("voice.mp3"),
            duration: 4.0,
            cues: if text.is_empty() {
                Vec::new()
            } else {
                segment_captions(text, 4.0, 1, 0.0).unwrap()
            },
        }
    }

    fn settings() -> SceneRenderSettings {
        SceneRenderSettings::new(FrameSize::new(1280, 720), 10)
    }

    #[test]
    fn test_image_scene_is_held_for_duration() {
        let files = vec![PathBuf::from("c0.txt"), PathBuf::from("c1.txt")];
        let cmd = scene_command(
            &clip(VisualKind::Image, "hello world"),
            &settings(),
            &files,
            Path::new("scene.mp4"),
        )
        .unwrap();
        let joined = cmd.build_args().join(" ");

        assert!(joined.contains("-loop 1 -framerate 10 -t 4.000 -i still.png -i voice.mp3"));
        assert!(joined.contains("scale=1280:720:force_original_aspect_ratio=decrease"));
        assert!(joined.contains("fps=10,drawtext="));
        assert!(joined.contains("[1:a]apad[a]"));
        assert!(joined.contains("-map [v] -map [a]"));
        assert!(joined.ends_with("-t 4.000 scene.mp4"));
    }

    #[test]
    fn test_video_scene_is_looped() {
        let cmd = scene_command(
            &clip(VisualKind::Video, ""),
            &settings(),
            &[],
            Path::new("scene.mp4"),
        )
        .unwrap();
        let joined = cmd.build_args().join(" ");

        assert!(joined.contains("-stream_loop -1 -t 4.000 -i footage.mp4"));
        assert!(!joined.contains("drawtext"));
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let mut c = clip(VisualKind::Image, "");
        c.duration = 0.0;
        assert!(scene_command(&c, &settings(), &[], Path::new("o.mp4")).is_err());
    }

    #[tokio::test]
    async fn test_missing_font_fails_before_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("still.png");
        let audio = dir.path().join("voice.mp3");
        std::fs::write(&image, b"png").unwrap();
        std::fs::write(&audio, b"mp3").unwrap();

        let mut c = clip(VisualKind::Image, "hello world");
        c.visual.path = image;
        c.audio_path = audio;

        let settings =
            settings().with_captions(CaptionStyle::default().with_font(dir.path().join("none.ttf")));
        let err = compose_scene(
            &c,
            &settings,
            dir.path(),
            &dir.path().join("out.mp4"),
            &FfmpegRunner::new(),
        )
        .await
        .unwrap_err();
        assert!(err.is_caption_error());
    }

    #[tokio::test]
    async fn test_missing_visual_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = compose_scene(
            &clip(VisualKind::Image, ""),
            &settings(),
            dir.path(),
            &dir.path().join("out.mp4"),
            &FfmpegRunner::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
