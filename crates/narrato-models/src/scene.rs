//! Scene inputs and built scene clips.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::captions::{CaptionCue, CAPTION_TOLERANCE_SECS};

/// One scene as supplied by the client.
///
/// Accepts either the object form `{"visual", "text", "duration"?}` or the
/// positional form `[visual, text]` / `[visual, text, duration]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSceneInput")]
pub struct SceneInput {
    /// Path, URL or prompt, interpreted per genre
    pub visual: String,
    /// Narration text
    pub text: String,
    /// Explicit duration in seconds; overrides the narration length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl SceneInput {
    pub fn new(visual: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            visual: visual.into(),
            text: text.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSceneInput {
    Object {
        visual: String,
        text: String,
        #[serde(default)]
        duration: Option<f64>,
    },
    Triple(String, String, Option<f64>),
    Pair(String, String),
}

impl From<RawSceneInput> for SceneInput {
    fn from(raw: RawSceneInput) -> Self {
        match raw {
            RawSceneInput::Object {
                visual,
                text,
                duration,
            }
            | RawSceneInput::Triple(visual, text, duration) => Self {
                visual,
                text,
                duration,
            },
            RawSceneInput::Pair(visual, text) => Self::new(visual, text),
        }
    }
}

/// Kind of media backing a visual track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualKind {
    /// Still image held for the scene duration
    Image,
    /// Video looped or cut to the scene duration
    Video,
}

impl VisualKind {
    /// Guess the kind from a file extension. Unknown extensions are images.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("mp4" | "mov" | "webm" | "mkv" | "avi" | "m4v") => VisualKind::Video,
            _ => VisualKind::Image,
        }
    }
}

/// A local visual asset ready for compositing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualTrack {
    pub path: PathBuf,
    pub kind: VisualKind,
}

impl VisualTrack {
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: VisualKind::Image,
        }
    }

    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: VisualKind::Video,
        }
    }
}

/// A timed, captioned audiovisual clip descriptor.
///
/// `duration` is authoritative: the visual is held or cut to it and the cues
/// partition `[0, duration)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneClip {
    pub visual: VisualTrack,
    pub audio_path: PathBuf,
    pub duration: f64,
    pub cues: Vec<CaptionCue>,
}

impl SceneClip {
    /// True when there are no cues, or the cues tile `[0, duration)` exactly.
    pub fn cues_cover_duration(&self) -> bool {
        let Some(first) = self.cues.first() else {
            return true;
        };
        let Some(last) = self.cues.last() else {
            return true;
        };
        first.start.abs() < CAPTION_TOLERANCE_SECS
            && (last.end - self.duration).abs() < CAPTION_TOLERANCE_SECS
            && self
                .cues
                .windows(2)
                .all(|w| (w[0].end - w[1].start).abs() < CAPTION_TOLERANCE_SECS)
    }
}
