//! Axum HTTP API server.
//!
//! This crate provides:
//! - Task submission and status polling
//! - Story, image, stock-footage and narration endpoints
//! - Rate limiting, request ids and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
