//! S3-compatible object storage client (R2, S3, MinIO).

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info, warn};

use crate::asset::{resolve_asset_name, AssetKind};
use crate::error::{StorageError, StorageResult};
use crate::store::{AssetStore, StoredAsset};

/// Configuration for the storage client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Region ("auto" for R2)
    pub region: String,
    /// Base URL under which objects are publicly readable; defaults to the
    /// path-style bucket URL
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: required("STORAGE_ENDPOINT_URL")?,
            access_key_id: required("STORAGE_ACCESS_KEY_ID")?,
            secret_access_key: required("STORAGE_SECRET_ACCESS_KEY")?,
            bucket: required("STORAGE_BUCKET")?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("STORAGE_PUBLIC_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
        })
    }

    /// Public URL of `key`.
    pub fn public_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!(
                "{}/{}/{}",
                self.endpoint_url.trim_end_matches('/'),
                self.bucket,
                key
            ),
        }
    }
}

fn required(name: &str) -> StorageResult<String> {
    std::env::var(name).map_err(|_| StorageError::config_error(format!("{name} not set")))
}

/// Object storage client.
#[derive(Clone)]
pub struct S3AssetStore {
    client: Client,
    config: StorageConfig,
}

impl S3AssetStore {
    pub fn new(config: StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "narrato",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            config,
        }
    }

    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(StorageConfig::from_env()?))
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Check if an object exists.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let text = format!("{e:?}");
                if text.contains("NotFound") || text.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StorageError::Backend(e.to_string()))
                }
            }
        }
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("storage connectivity check failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn upload(&self, path: &Path, kind: AssetKind) -> StorageResult<StoredAsset> {
        let name = kind.new_name();
        let key = kind.object_key(&name);
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(body)
            .content_type(kind.content_type())
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(StoredAsset {
            url: self.config.public_url(&key),
            name,
            key,
        })
    }

    async fn delete(&self, reference: &str) -> StorageResult<bool> {
        let name = resolve_asset_name(reference)?;
        let key = AssetKind::Audio.object_key(&name);

        // S3 deletes are idempotent and succeed for missing keys.
        if !self.exists(&key).await? {
            warn!("Asked to delete missing object {}", key);
            return Ok(false);
        }

        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        info!("Deleted {}", key);
        Ok(true)
    }
}
