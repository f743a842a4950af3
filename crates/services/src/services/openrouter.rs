//! OpenRouter chat-completions client and the catalogue of selectable models.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::language_model::{ChatRequest, LanguageModel, LanguageModelError};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_PARSER_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_ADVISOR_MODEL: &str = "openai/gpt-4o";

const REFERER: &str = "https://cannabis-tracker.app";
const TITLE: &str = "Cannabis Business Tracker";

/// Price per 1M tokens, in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPricing {
    pub prompt: f64,
    pub completion: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub pricing: ModelPricing,
    pub context_length: u32,
    pub description: &'static str,
}

pub const AVAILABLE_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "anthropic/claude-3.5-sonnet",
        name: "Claude 3.5 Sonnet",
        pricing: ModelPricing { prompt: 3.0, completion: 15.0 },
        context_length: 200_000,
        description: "Best for complex reasoning and analysis",
    },
    ModelInfo {
        id: "openai/gpt-4o",
        name: "GPT-4o",
        pricing: ModelPricing { prompt: 2.5, completion: 10.0 },
        context_length: 128_000,
        description: "Great balance of speed and intelligence",
    },
    ModelInfo {
        id: "openai/gpt-4o-mini",
        name: "GPT-4o Mini",
        pricing: ModelPricing { prompt: 0.15, completion: 0.6 },
        context_length: 128_000,
        description: "Fast and cost-effective",
    },
    ModelInfo {
        id: "google/gemini-flash-1.5",
        name: "Gemini Flash 1.5",
        pricing: ModelPricing { prompt: 0.075, completion: 0.3 },
        context_length: 1_000_000,
        description: "Ultra-fast and cheap",
    },
    ModelInfo {
        id: "meta-llama/llama-3.1-8b-instruct:free",
        name: "Llama 3.1 8B (Free)",
        pricing: ModelPricing { prompt: 0.0, completion: 0.0 },
        context_length: 131_072,
        description: "Free model, good for basic tasks",
    },
];

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    AVAILABLE_MODELS.iter().find(|m| m.id == id)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LanguageModelError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cannabis-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LanguageModelError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
    async fn chat(&self, request: ChatRequest) -> Result<String, LanguageModelError> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            prompt_chars = request.messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "Sending chat completion"
        );

        let res = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => {
                let body = res
                    .json::<ChatResponse>()
                    .await
                    .map_err(|e| LanguageModelError::Serde(e.to_string()))?;
                body.into_text().ok_or(LanguageModelError::EmptyResponse)
            }
            StatusCode::UNAUTHORIZED => Err(LanguageModelError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(LanguageModelError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(LanguageModelError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> LanguageModelError {
    if e.is_timeout() {
        LanguageModelError::Timeout
    } else {
        LanguageModelError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_models_are_in_catalogue() {
        assert!(find_model(DEFAULT_PARSER_MODEL).is_some());
        assert!(find_model(DEFAULT_ADVISOR_MODEL).is_some());
        assert!(find_model("nope/unknown").is_none());
    }

    #[test]
    fn free_model_costs_nothing() {
        let llama = find_model("meta-llama/llama-3.1-8b-instruct:free").unwrap();
        assert_eq!(llama.pricing, ModelPricing { prompt: 0.0, completion: 0.0 });
        assert_eq!(llama.context_length, 131_072);
    }

    #[test]
    fn response_text_is_first_choice_content() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}},{"message":{"content":"x"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().as_deref(), Some("{\"a\":1}"));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.into_text(), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OpenRouterClient::new(
            SecretString::from("k"),
            "http://localhost:9/api/v1/",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9/api/v1/chat/completions");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let client = OpenRouterClient::new(
            SecretString::from("k"),
            "http://127.0.0.1:9",
            Duration::from_secs(2),
        )
        .unwrap();

        let result = client
            .chat(ChatRequest::new(DEFAULT_PARSER_MODEL, "s", "u"))
            .await;

        assert!(matches!(
            result,
            Err(LanguageModelError::Transport(_) | LanguageModelError::Timeout)
        ));
    }
}
