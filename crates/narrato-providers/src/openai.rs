//! Story generation over the OpenAI chat completions API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use narrato_models::{Genre, Story};

use crate::config::{require, trim_base, ProviderConfig};
use crate::error::{check_status, ProviderError, ProviderResult};
use crate::prompts::{system_instructions, user_prompt};
use crate::retry::with_retry;
use crate::traits::StoryWriter;

const SERVICE: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// OpenAI-backed [`StoryWriter`].
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    config: ProviderConfig,
}

impl OpenAiClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self {
            http: config.http_client()?,
            base_url: trim_base(&config.openai_base_url),
            api_key: require(&config.openai_api_key, "OPENAI_API_KEY")?,
            model: config.openai_model.clone(),
            config: config.clone(),
        })
    }

    async fn complete(&self, system: &str, user: &str) -> ProviderResult<Story> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "story",
                    "strict": true,
                    "schema": Story::json_schema(),
                }
            }),
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response: ChatResponse = check_status(SERVICE, response).await?.json().await?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ProviderError::invalid_response(SERVICE, "no choices"))?;

        if let Some(refusal) = message.refusal {
            return Err(ProviderError::invalid_response(
                SERVICE,
                format!("request refused: {refusal}"),
            ));
        }
        let content = message
            .content
            .ok_or_else(|| ProviderError::invalid_response(SERVICE, "empty message"))?;
        debug!("Story response: {} bytes", content.len());

        let story: Story = serde_json::from_str(&content)
            .map_err(|e| ProviderError::invalid_response(SERVICE, e.to_string()))?;
        if story.scenes.is_empty() {
            return Err(ProviderError::invalid_response(SERVICE, "story has no scenes"));
        }
        Ok(story)
    }
}

#[async_trait]
impl StoryWriter for OpenAiClient {
    async fn write_story(&self, genre: Genre, topic: &str, language: &str) -> ProviderResult<Story> {
        info!("Writing {} story about {:?} in {}", genre, topic, language);
        let system = system_instructions(genre);
        let user = user_prompt(genre, topic, language);

        with_retry(
            SERVICE,
            self.config.max_retries,
            self.config.retry_base_delay,
            || self.complete(system, &user),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ProviderConfig {
        ProviderConfig {
            openai_api_key: Some("sk-test".into()),
            openai_base_url: server.uri(),
            retry_base_delay: Duration::from_millis(1),
            ..ProviderConfig::default()
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn test_write_story_parses_structured_output() {
        let server = MockServer::start().await;
        let story = r#"{"scenes":[{"sentences":"Hola.","visual_prompt":"a fox"}],"complete_story":"Hola."}"#;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(story)))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config(&server)).unwrap();
        let story = client
            .write_story(Genre::Animation, "a fox", "Spanish")
            .await
            .unwrap();
        assert_eq!(story.scenes.len(), 1);
        assert_eq!(story.scenes[0].visual_prompt, "a fox");
        assert_eq!(story.complete_story, "Hola.");
    }

    #[tokio::test]
    async fn test_malformed_story_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json")))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config(&server)).unwrap();
        let err = client
            .write_story(Genre::Motivation, "grit", "English")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&config(&server)).unwrap();
        let err = client
            .write_story(Genre::Commercial, "example.com", "English")
            .await
            .unwrap_err();
        match err {
            ProviderError::Api { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(OpenAiClient::new(&ProviderConfig::default()).is_err());
    }
}
