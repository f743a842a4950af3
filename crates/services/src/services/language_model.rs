//! Chat-completion seam shared by the sale parser and the business advisor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LanguageModelError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("empty response from language model")]
    EmptyResponse,
    #[error("response failed validation: {0}")]
    Schema(String),
    #[error("missing api key: OPENROUTER_API_KEY environment variable not set")]
    MissingApiKey,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for a chat completion. Serialized as-is onto the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::system(system), Message::user(user)],
            temperature: 0.1,
            max_tokens: 1000,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Anything that can answer a chat completion with the first choice's text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<String, LanguageModelError>;
}

/// Stand-in used when no API key is configured. Every call fails, which sends
/// callers down their fallback paths.
#[derive(Debug, Clone, Default)]
pub struct DisabledLanguageModel;

#[async_trait]
impl LanguageModel for DisabledLanguageModel {
    async fn chat(&self, _request: ChatRequest) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::MissingApiKey)
    }
}

/// Send a request expecting a JSON document in the reply and decode it into `T`.
pub async fn complete_json<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    request: ChatRequest,
) -> Result<T, LanguageModelError> {
    let response = model.chat(request).await?;

    if response.trim().is_empty() {
        tracing::error!("Language model returned an empty response");
        return Err(LanguageModelError::EmptyResponse);
    }

    // The reply might be wrapped in a markdown code block
    let json_str = extract_json(&response);

    serde_json::from_str(json_str).map_err(|e| {
        tracing::error!(
            json_error = %e,
            response_length = response.len(),
            extracted_json_preview = %json_str.chars().take(500).collect::<String>(),
            "Failed to parse JSON response from language model"
        );
        LanguageModelError::Serde(e.to_string())
    })
}

/// Extract JSON from a string that might contain markdown code blocks
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        // Skip past any language identifier on the same line
        let content_start = text[content_start..]
            .find('\n')
            .map(|i| content_start + i + 1)
            .unwrap_or(content_start);
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    text
}
