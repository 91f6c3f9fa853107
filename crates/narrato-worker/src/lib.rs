//! Narrated video worker.
//!
//! This crate provides:
//! - The job executor consuming render jobs from the Redis stream
//! - The scene builder (narration, timing, captions, visual, composite)
//! - Timeline assembly, upload and terminal status recording
//! - Graceful shutdown with FFmpeg cancellation

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod renderer;
pub mod scene_builder;

#[cfg(test)]
mod testing;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use processor::{process_job, run_task, JobOutcome, ProcessingContext};
pub use renderer::{FfmpegRenderer, MediaRenderer};
pub use scene_builder::{build_scene, BuiltScene};
