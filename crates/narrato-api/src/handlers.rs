//! HTTP handlers.

pub mod assets;
pub mod health;
pub mod stories;
pub mod tasks;

pub use assets::{delete_audio, generate_audio, generate_image, search_stock_video};
pub use health::{health, ready};
pub use stories::generate_story;
pub use tasks::{get_task_status, submit_task};

use narrato_models::Genre;

use crate::error::{ApiError, ApiResult};

/// Parse the `:genre` path segment.
pub(crate) fn parse_genre(raw: &str) -> ApiResult<Genre> {
    raw.parse().map_err(|e: narrato_models::GenreParseError| ApiError::bad_request(e.to_string()))
}

/// A query value that is present and not blank.
pub(crate) fn required(value: Option<String>, message: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}
