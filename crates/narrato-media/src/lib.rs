//! FFmpeg CLI wrapper for narrated video rendering.
//!
//! This crate provides:
//! - Multi-input FFmpeg command building
//! - A runner with timeout and cancellation via a tokio watch channel
//! - FFprobe duration probing
//! - Scene composition (visual + captions + narration)
//! - Timeline assembly (concat + background music mix + final encode)
//!
//! Command construction is kept separate from execution so the exact
//! arguments can be checked without FFmpeg installed.

pub mod command;
pub mod error;
pub mod overlay;
pub mod probe;
pub mod progress;
pub mod scene;
pub mod timeline;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use overlay::{CaptionStyle, DEFAULT_CAPTION_FONT};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use scene::{compose_scene, scene_command, SceneRenderSettings};
pub use timeline::{assemble_timeline, concat_list, timeline_command};
