//! The blob storage seam used by the worker and the API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::asset::{resolve_asset_name, AssetKind};
use crate::error::{StorageError, StorageResult};

/// A successfully uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    /// Storage-assigned unique name (`<uuid>.<ext>`)
    pub name: String,
    /// Full object key including the kind prefix
    pub key: String,
    /// Publicly addressable URL
    pub url: String,
}

/// Upload and delete assets.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload `path` under a fresh unique name. Each call creates a new object.
    async fn upload(&self, path: &Path, kind: AssetKind) -> StorageResult<StoredAsset>;

    /// Delete the audio asset referenced by `reference` (URL, key or name).
    /// Returns `false` when no such object exists.
    async fn delete(&self, reference: &str) -> StorageResult<bool>;
}

/// In-process store keeping uploads in memory.
///
/// Used by tests and local runs without object storage.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    base_url: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryAssetStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .map(|o| o.contains_key(key))
            .unwrap_or(false)
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Backend("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn upload(&self, path: &Path, kind: AssetKind) -> StorageResult<StoredAsset> {
        let data = tokio::fs::read(path).await?;
        let name = kind.new_name();
        let key = kind.object_key(&name);
        self.lock()?.insert(key.clone(), data);
        Ok(StoredAsset {
            url: format!("{}/{}", self.base_url.trim_end_matches('/'), key),
            name,
            key,
        })
    }

    async fn delete(&self, reference: &str) -> StorageResult<bool> {
        let name = resolve_asset_name(reference)?;
        let key = AssetKind::Audio.object_key(&name);
        Ok(self.lock()?.remove(&key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("voice.mp3");
        std::fs::write(&file, b"mp3").unwrap();

        let store = MemoryAssetStore::new("https://cdn.example.com/");
        let asset = store.upload(&file, AssetKind::Audio).await.unwrap();
        assert!(asset.key.starts_with("audio-files/"));
        assert_eq!(
            asset.url,
            format!("https://cdn.example.com/{}", asset.key)
        );
        assert!(store.contains(&asset.key));

        assert!(store.delete(&asset.url).await.unwrap());
        assert!(!store.delete(&asset.name).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_each_upload_is_a_new_object() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("final.mp4");
        std::fs::write(&file, b"mp4").unwrap();

        let store = MemoryAssetStore::new("http://local");
        let a = store.upload(&file, AssetKind::Video).await.unwrap();
        let b = store.upload(&file, AssetKind::Video).await.unwrap();
        assert_ne!(a.name, b.name);
        assert_eq!(store.len(), 2);
    }
}
