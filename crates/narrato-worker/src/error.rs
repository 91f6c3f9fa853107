//! Worker error types.

use thiserror::Error;

use narrato_media::MediaError;
use narrato_models::CaptionError;
use narrato_providers::ProviderError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failures that end a task. The display string becomes the task's error
/// detail.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(String),

    #[error("Caption render failed: {0}")]
    CaptionRender(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("Task timed out after {0} seconds")]
    Timeout(u64),

    #[error("Task cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Queue error: {0}")]
    Queue(#[from] narrato_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn asset_unavailable(msg: impl Into<String>) -> Self {
        Self::AssetUnavailable(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn invalid_scene(msg: impl Into<String>) -> Self {
        Self::InvalidScene(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// A collaborator call failed while building a scene.
    pub fn from_provider(context: &str, err: ProviderError) -> Self {
        Self::AssetUnavailable(format!("{context}: {err}"))
    }

    /// Map a media failure, keeping caption and cancellation failures apart
    /// from encoding failures.
    pub fn from_media(err: MediaError) -> Self {
        match err {
            MediaError::Cancelled => Self::Cancelled,
            MediaError::Timeout(secs) => Self::Encoding(format!("FFmpeg timed out after {secs} seconds")),
            e if e.is_caption_error() => Self::CaptionRender(e.to_string()),
            e => Self::Encoding(e.to_string()),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::AssetUnavailable(_) => "asset_unavailable",
            WorkerError::CaptionRender(_) => "caption_render",
            WorkerError::Encoding(_) => "encoding",
            WorkerError::InvalidScene(_) => "invalid_scene",
            WorkerError::Timeout(_) => "timeout",
            WorkerError::Cancelled => "cancelled",
            WorkerError::ConfigError(_) => "config",
            WorkerError::Queue(_) => "queue",
            WorkerError::Io(_) => "io",
        }
    }
}

impl From<CaptionError> for WorkerError {
    fn from(err: CaptionError) -> Self {
        Self::CaptionRender(err.to_string())
    }
}
