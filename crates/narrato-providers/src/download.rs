//! Streaming downloads of remote assets.

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{check_status, ProviderError, ProviderResult};
use crate::traits::AssetFetcher;

const SERVICE: &str = "download";

/// Write a response body to `dest` chunk by chunk.
///
/// A partially written file is removed on failure. Returns the byte count.
pub(crate) async fn stream_to_file(response: reqwest::Response, dest: &Path) -> ProviderResult<u64> {
    let result = write_body(response, dest).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(dest).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial file {}: {}", dest.display(), e);
            }
        }
    }
    result
}

async fn write_body(response: reqwest::Response, dest: &Path) -> ProviderResult<u64> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        return Err(ProviderError::invalid_response(SERVICE, "empty body"));
    }
    Ok(written)
}

/// Download `url` to `dest`.
pub async fn download_to_file(http: &reqwest::Client, url: &str, dest: &Path) -> ProviderResult<u64> {
    let response = http.get(url).send().await?;
    let response = check_status(SERVICE, response).await?;
    let written = stream_to_file(response, dest).await?;
    debug!("Downloaded {} ({} bytes) to {}", url, written, dest.display());
    Ok(written)
}

/// [`AssetFetcher`] over plain HTTP(S).
#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> ProviderResult<()> {
        download_to_file(&self.http, url, dest).await.map(|_| ())
    }
}
