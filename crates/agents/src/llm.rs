use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use estately_core::config::LlmConfig;

#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion client is not configured: {0}")]
    NotConfigured(String),
    #[error("completion transport failure: {0}")]
    Network(String),
    #[error("completion API returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("completion response was malformed: {0}")]
    InvalidResponse(String),
}

/// Single chat-completion call. One request, one text answer, no retries;
/// callers decide what a failure means for their turn.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// OpenAI-compatible chat-completions client over HTTPS with bearer auth.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpCompletionClient {
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| CompletionError::NotConfigured("llm.api_key is not set".to_string()))?
            .expose_secret()
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| CompletionError::Network(error.to_string()))?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string(), api_key })
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: String,
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ApiRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|error| CompletionError::Network(error.to_string()))?;

        let status = response.status();
        let text =
            response.text().await.map_err(|error| CompletionError::Network(error.to_string()))?;

        if !status.is_success() {
            return Err(CompletionError::Api { status: status.as_u16(), message: text });
        }

        let parsed: ApiResponse = serde_json::from_str(&text)
            .map_err(|error| CompletionError::InvalidResponse(error.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("response has no choices".to_string()))
    }
}
