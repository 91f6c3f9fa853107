//! Job payloads carried on the stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use narrato_models::{Genre, SceneInput, TaskId};

/// Render one narrated video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderVideoJob {
    pub task_id: TaskId,
    pub genre: Genre,
    /// Narration language, e.g. "Spanish"
    pub language: String,
    /// Scenes in playback order
    pub scenes: Vec<SceneInput>,
    pub created_at: DateTime<Utc>,
}

impl RenderVideoJob {
    pub fn new(
        task_id: TaskId,
        genre: Genre,
        language: impl Into<String>,
        scenes: Vec<SceneInput>,
    ) -> Self {
        Self {
            task_id,
            genre,
            language: language.into(),
            scenes,
            created_at: Utc::now(),
        }
    }

    /// Key used to reject a second enqueue of the same task.
    pub fn idempotency_key(&self) -> String {
        format!("render:{}", self.task_id)
    }
}
