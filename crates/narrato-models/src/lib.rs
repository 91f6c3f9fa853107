//! Shared data models for the narrato backend.
//!
//! This crate provides Serde-serializable types for:
//! - Tasks and their status records
//! - Scene inputs, scene clips and timelines
//! - Genre profiles (caption chunking, frame size, voices, music)
//! - Story scripts returned by the text-generation service
//!
//! It also holds the pure timing logic shared by the worker and the media
//! crate: caption segmentation and timeline duration.

pub mod captions;
pub mod encoding;
pub mod genre;
pub mod scene;
pub mod story;
pub mod task;
pub mod timeline;

// Re-export common types
pub use captions::{segment_captions, CaptionCue, CaptionError, CAPTION_TOLERANCE_SECS};
pub use encoding::EncodingConfig;
pub use genre::{
    FrameSize, Genre, GenreParseError, GenreProfile, VisualSource, VoiceMap, DEFAULT_LANGUAGE,
};
pub use scene::{SceneClip, SceneInput, VisualKind, VisualTrack};
pub use story::{Story, StoryScene};
pub use task::{TaskId, TaskRecord, TaskStatus};
pub use timeline::{MusicBed, Timeline, TimelineEntry};
