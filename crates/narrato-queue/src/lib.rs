//! Task status store and job queue.
//!
//! This crate provides:
//! - The status store (`task_status:<id>` records, Redis or in-memory)
//! - Job enqueueing via Redis Streams
//! - Worker consumption through a consumer group, with crash recovery by
//!   claiming idle pending messages

pub mod error;
pub mod job;
pub mod queue;
pub mod status;

pub use error::{QueueError, QueueResult};
pub use job::RenderVideoJob;
pub use queue::{
    decode_entry, record_malformed, Delivery, JobDispatcher, JobQueue, MalformedEntry, QueueConfig,
    DEFAULT_STATUS_TTL_SECS,
};
pub use status::{MemoryStatusStore, RedisStatusStore, StatusStore};
