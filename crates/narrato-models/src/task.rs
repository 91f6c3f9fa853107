//! Task identifiers and status records.
//!
//! A task is created when a submission is accepted and is written exactly
//! twice: once as `processing` by the submission endpoint, once with a
//! terminal status by the worker. The persisted record layout is
//! `{status, video_url?, error?}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the status record in the shared store.
    pub fn status_key(&self) -> String {
        format!("task_status:{}", self.0)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Task processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted and not yet finished
    #[default]
    Processing,
    /// Final artifact uploaded
    Completed,
    /// Aborted with an error detail
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Terminal states never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status record persisted per task and returned to polling clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskRecord {
    pub status: TaskStatus,
    /// Public URL of the final artifact (completed only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Human-readable failure detail (failed only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    /// Initial record written before the job is handed off.
    pub fn processing() -> Self {
        Self::default()
    }

    pub fn completed(video_url: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Completed,
            video_url: Some(video_url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Failed,
            video_url: None,
            error: Some(error.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `next` may replace this record.
    ///
    /// Rewriting the identical record is always allowed (idempotent
    /// overwrite); otherwise only a non-terminal record may change.
    pub fn can_transition_to(&self, next: &TaskRecord) -> bool {
        self == next || !self.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_key_layout() {
        let id = TaskId::from_string("abc-123");
        assert_eq!(id.status_key(), "task_status:abc-123");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn test_processing_record_serializes_without_optionals() {
        let json = serde_json::to_string(&TaskRecord::processing()).unwrap();
        assert_eq!(json, r#"{"status":"processing"}"#);
    }

    #[test]
    fn test_completed_record_layout() {
        let record = TaskRecord::completed("https://cdn.example.com/video-files/a.mp4");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"status":"completed","video_url":"https://cdn.example.com/video-files/a.mp4"}"#
        );
        let back: TaskRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_failed_record_layout() {
        let json = serde_json::to_string(&TaskRecord::failed("boom")).unwrap();
        assert_eq!(json, r#"{"status":"failed","error":"boom"}"#);
    }

    #[test]
    fn test_terminal_records_are_monotonic() {
        let processing = TaskRecord::processing();
        let done = TaskRecord::completed("u");
        let failed = TaskRecord::failed("e");

        assert!(processing.can_transition_to(&done));
        assert!(processing.can_transition_to(&failed));
        assert!(done.can_transition_to(&done));
        assert!(!done.can_transition_to(&failed));
        assert!(!done.can_transition_to(&processing));
        assert!(!failed.can_transition_to(&done));
    }
}
