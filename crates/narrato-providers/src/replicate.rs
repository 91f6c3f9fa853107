//! Image generation over the Replicate predictions API (flux-schnell).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{require, trim_base, ProviderConfig};
use crate::error::{check_status, ProviderError, ProviderResult};
use crate::retry::with_retry;
use crate::traits::ImageGenerator;

const SERVICE: &str = "replicate";
const MODEL_PATH: &str = "black-forest-labs/flux-schnell";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: u32 = 60;

#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl Prediction {
    fn first_output(&self) -> Option<String> {
        match self.output.as_ref()? {
            serde_json::Value::Array(items) => items.first()?.as_str().map(str::to_string),
            serde_json::Value::String(url) => Some(url.clone()),
            _ => None,
        }
    }

    fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "canceled")
    }
}

/// Replicate-backed [`ImageGenerator`].
#[derive(Clone)]
pub struct ReplicateClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    config: ProviderConfig,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            base_url: trim_base(&config.replicate_base_url),
            api_token: require(&config.replicate_api_token, "REPLICATE_API_TOKEN")?,
            config: config.clone(),
            poll_interval: POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn create(&self, prompt: &str) -> ProviderResult<Prediction> {
        let response = self
            .http
            .post(format!("{}/v1/models/{}/predictions", self.base_url, MODEL_PATH))
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&serde_json::json!({
                "input": { "prompt": prompt, "output_format": "jpg" }
            }))
            .send()
            .await?;
        Ok(check_status(SERVICE, response).await?.json().await?)
    }

    async fn get(&self, id: &str) -> ProviderResult<Prediction> {
        let response = self
            .http
            .get(format!("{}/v1/predictions/{}", self.base_url, id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        Ok(check_status(SERVICE, response).await?.json().await?)
    }

    /// Poll until the prediction yields an output or fails.
    async fn wait_for_output(&self, mut prediction: Prediction) -> ProviderResult<String> {
        for _ in 0..MAX_POLLS {
            if let Some(url) = prediction.first_output() {
                return Ok(url);
            }
            if prediction.is_failed() {
                let detail = prediction
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| prediction.status.clone());
                return Err(ProviderError::invalid_response(
                    SERVICE,
                    format!("prediction {} failed: {}", prediction.id, detail),
                ));
            }
            debug!("Prediction {} is {}", prediction.id, prediction.status);
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.get(&prediction.id).await?;
        }
        Err(ProviderError::Timeout(
            (self.poll_interval * MAX_POLLS).as_secs(),
        ))
    }
}

#[async_trait]
impl ImageGenerator for ReplicateClient {
    async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        let prediction = with_retry(
            SERVICE,
            self.config.max_retries,
            self.config.retry_base_delay,
            || self.create(prompt),
        )
        .await?;
        let url = self.wait_for_output(prediction).await?;
        info!("Generated image: {}", url);
        Ok(url)
    }
}
