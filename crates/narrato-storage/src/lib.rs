//! Blob storage for rendered videos and narration audio.
//!
//! This crate provides:
//! - The [`AssetStore`] seam (`upload`, `delete`)
//! - An S3-compatible implementation (R2, S3, MinIO)
//! - An in-memory implementation for tests and local runs
//! - Asset naming: `video-files/<uuid>.mp4`, `audio-files/<uuid>.mp3`

pub mod asset;
pub mod client;
pub mod error;
pub mod store;

pub use asset::{resolve_asset_name, AssetKind};
pub use client::{S3AssetStore, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use store::{AssetStore, MemoryAssetStore, StoredAsset};
