//! Speech synthesis over the ElevenLabs text-to-speech API.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::{require, trim_base, ProviderConfig};
use crate::download::stream_to_file;
use crate::error::{check_status, ProviderResult};
use crate::retry::with_retry;
use crate::traits::SpeechSynthesizer;

const SERVICE: &str = "elevenlabs";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

/// ElevenLabs-backed [`SpeechSynthesizer`]; writes MPEG audio.
#[derive(Clone)]
pub struct ElevenLabsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
    config: ProviderConfig,
}

impl ElevenLabsClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            base_url: trim_base(&config.elevenlabs_base_url),
            api_key: require(&config.elevenlabs_api_key, "ELEVENLABS_API_KEY")?,
            model_id: config.elevenlabs_model_id.clone(),
            config: config.clone(),
        })
    }

    async fn request(&self, text: &str, voice_id: &str, dest: &Path) -> ProviderResult<u64> {
        let body = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings::default(),
        };
        let response = self
            .http
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, voice_id))
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(SERVICE, response).await?;
        stream_to_file(response, dest).await
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice_id: &str, dest: &Path) -> ProviderResult<()> {
        let bytes = with_retry(
            SERVICE,
            self.config.max_retries,
            self.config.retry_base_delay,
            || self.request(text, voice_id, dest),
        )
        .await?;
        info!(
            "Synthesized {} chars with voice {} ({} bytes)",
            text.chars().count(),
            voice_id,
            bytes
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ProviderConfig {
        ProviderConfig {
            elevenlabs_api_key: Some("xi-test".into()),
            elevenlabs_base_url: server.uri(),
            retry_base_delay: Duration::from_millis(1),
            ..ProviderConfig::default()
        }
    }

    #[tokio::test]
    async fn test_synthesize_writes_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/voice-1"))
            .and(header("xi-api-key", "xi-test"))
            .and(header("accept", "audio/mpeg"))
            .and(body_partial_json(serde_json::json!({
                "text": "Hello world",
                "model_id": "eleven_turbo_v2_5",
                "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3fake-mp3".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("narration.mp3");
        let client = ElevenLabsClient::new(&config(&server)).unwrap();
        client.synthesize("Hello world", "voice-1", &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"ID3fake-mp3");
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("narration.mp3");
        let client = ElevenLabsClient::new(&config(&server)).unwrap();
        let err = client.synthesize("Hi", "voice-1", &dest).await.unwrap_err();

        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_requires_api_key() {
        assert!(ElevenLabsClient::new(&ProviderConfig::default()).is_err());
    }
}
