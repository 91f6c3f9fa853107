//! Provider endpoints and credentials.

use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

/// Settings for every external collaborator.
///
/// Keys are optional here; each client refuses to build without the key it
/// needs, so a process only fails for the providers it actually uses.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,

    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: String,
    pub elevenlabs_model_id: String,

    pub pexels_api_key: Option<String>,
    pub pexels_base_url: String,

    pub replicate_api_token: Option<String>,
    pub replicate_base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
    /// Retries for transient failures
    pub max_retries: u32,
    /// First backoff delay; doubles per attempt
    pub retry_base_delay: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            elevenlabs_api_key: None,
            elevenlabs_base_url: "https://api.elevenlabs.io".to_string(),
            elevenlabs_model_id: "eleven_turbo_v2_5".to_string(),
            pexels_api_key: None,
            pexels_base_url: "https://api.pexels.com".to_string(),
            replicate_api_token: None,
            replicate_base_url: "https://api.replicate.com".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let key = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            openai_api_key: key("OPENAI_API_KEY"),
            openai_base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            elevenlabs_api_key: key("ELEVENLABS_API_KEY"),
            elevenlabs_base_url: std::env::var("ELEVENLABS_BASE_URL")
                .unwrap_or(defaults.elevenlabs_base_url),
            elevenlabs_model_id: std::env::var("ELEVENLABS_MODEL_ID")
                .unwrap_or(defaults.elevenlabs_model_id),
            pexels_api_key: key("PEXELS_API_KEY"),
            pexels_base_url: std::env::var("PEXELS_BASE_URL").unwrap_or(defaults.pexels_base_url),
            replicate_api_token: key("REPLICATE_API_TOKEN"),
            replicate_base_url: std::env::var("REPLICATE_BASE_URL")
                .unwrap_or(defaults.replicate_base_url),
            timeout: std::env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: std::env::var("PROVIDER_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay: defaults.retry_base_delay,
        }
    }

    /// HTTP client shared by all provider clients built from this config.
    pub fn http_client(&self) -> ProviderResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProviderError::from)
    }
}

pub(crate) fn require(key: &Option<String>, name: &str) -> ProviderResult<String> {
    key.clone()
        .ok_or_else(|| ProviderError::config(format!("{name} is not set")))
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.elevenlabs_model_id, "eleven_turbo_v2_5");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = require(&None, "PEXELS_API_KEY").unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
        assert!(err.to_string().contains("PEXELS_API_KEY"));
    }
}
