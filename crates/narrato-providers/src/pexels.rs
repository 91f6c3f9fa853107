//! Stock footage search over the Pexels video API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{require, trim_base, ProviderConfig};
use crate::error::{check_status, ProviderError, ProviderResult};
use crate::retry::with_retry;
use crate::traits::StockFootage;

const SERVICE: &str = "pexels";

/// Preferred rendition: Pexels-hosted SD 640x360.
const PREFERRED_WIDTH: u32 = 640;
const PREFERRED_HEIGHT: u32 = 360;
const PREFERRED_QUALITY: &str = "sd";
const PREFERRED_HOST: &str = ".com/video-files";

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoFile {
    pub link: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub quality: Option<String>,
}

impl VideoFile {
    fn is_preferred(&self) -> bool {
        self.link.contains(PREFERRED_HOST)
            && self.width == Some(PREFERRED_WIDTH)
            && self.height == Some(PREFERRED_HEIGHT)
            && self.quality.as_deref() == Some(PREFERRED_QUALITY)
    }
}

/// Pick a clip link from search results.
///
/// The first preferred rendition of a video lasting at least `min_duration`
/// wins; otherwise the first file of the first video is used.
pub fn select_video_url(response: &SearchResponse, min_duration: f64) -> Option<String> {
    response
        .videos
        .iter()
        .filter(|v| v.duration >= min_duration)
        .flat_map(|v| v.video_files.iter())
        .find(|f| f.is_preferred())
        .or_else(|| response.videos.first().and_then(|v| v.video_files.first()))
        .map(|f| f.link.clone())
}

/// Pexels-backed [`StockFootage`].
#[derive(Clone)]
pub struct PexelsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    config: ProviderConfig,
}

impl PexelsClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            base_url: trim_base(&config.pexels_base_url),
            api_key: require(&config.pexels_api_key, "PEXELS_API_KEY")?,
            config: config.clone(),
        })
    }

    async fn fetch_results(&self, query: &str, limit: u32) -> ProviderResult<SearchResponse> {
        let limit = limit.max(1).to_string();
        let response = self
            .http
            .get(format!("{}/videos/search", self.base_url))
            .header("Authorization", &self.api_key)
            .query(&[("query", query), ("per_page", limit.as_str())])
            .send()
            .await?;
        Ok(check_status(SERVICE, response).await?.json().await?)
    }
}

#[async_trait]
impl StockFootage for PexelsClient {
    async fn search(&self, query: &str, limit: u32, min_duration: f64) -> ProviderResult<String> {
        let results = with_retry(
            SERVICE,
            self.config.max_retries,
            self.config.retry_base_delay,
            || self.fetch_results(query, limit),
        )
        .await?;
        debug!("Pexels returned {} videos for {:?}", results.videos.len(), query);

        let url = select_video_url(&results, min_duration)
            .ok_or_else(|| ProviderError::NoResults(format!("no stock footage for {query:?}")))?;
        info!("Selected stock clip for {:?}: {}", query, url);
        Ok(url)
    }
}
