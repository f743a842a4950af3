//! ElevenLabs text-to-speech with canned message templates.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;

use super::business_advisor::SaleHighlights;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_VOICE_ID: &str = "j7KV53NgP8U4LRS2k2Gs";
pub const DEFAULT_MODEL_ID: &str = "eleven_monolingual_v1";

#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
    #[error("missing api key: ELEVENLABS_API_KEY environment variable not set")]
    MissingApiKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl VoiceSettings {
    pub const GENERAL: Self = Self::preset(0.5, 0.8, 0.2);
    pub const SALE_CONFIRMATION: Self = Self::preset(0.6, 0.9, 0.3);
    pub const BUSINESS_INSIGHT: Self = Self::preset(0.7, 0.8, 0.1);
    pub const CUSTOMER_ALERT: Self = Self::preset(0.5, 0.9, 0.4);

    const fn preset(stability: f32, similarity_boost: f32, style: f32) -> Self {
        Self {
            stability,
            similarity_boost,
            style,
            use_speaker_boost: true,
        }
    }
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self::GENERAL
    }
}

/// Text to synthesize. Voice and model fall back to the client's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    pub voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The things the dashboard says out loud.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechMessage {
    General(String),
    SaleConfirmation(SaleHighlights),
    BusinessInsight(String),
    CustomerAlert { customer_name: String, message: String },
}

impl SpeechMessage {
    pub fn text(&self) -> String {
        match self {
            Self::General(text) | Self::BusinessInsight(text) => text.clone(),
            Self::SaleConfirmation(sale) => format!(
                "Nice! Sale confirmed for {}. {} grams of {} for {} dollars. Profit of {} dollars. Keep the good vibes flowing!",
                sale.customer_name,
                sale.quantity_grams,
                sale.strain_name.as_deref().unwrap_or("unknown"),
                sale.sale_price,
                sale.profit,
            ),
            Self::CustomerAlert {
                customer_name,
                message,
            } => format!("Hey! Customer alert for {}. {}", customer_name, message),
        }
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        match self {
            Self::General(_) => VoiceSettings::GENERAL,
            Self::SaleConfirmation(_) => VoiceSettings::SALE_CONFIRMATION,
            Self::BusinessInsight(_) => VoiceSettings::BUSINESS_INSIGHT,
            Self::CustomerAlert { .. } => VoiceSettings::CUSTOMER_ALERT,
        }
    }

    pub fn into_request(self) -> SpeechRequest {
        SpeechRequest {
            text: self.text(),
            voice_id: None,
            model_id: None,
            voice_settings: self.voice_settings(),
        }
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// MPEG audio for `request`.
    async fn synthesize(&self, request: SpeechRequest) -> Result<Bytes, SpeechError>;

    async fn voices(&self) -> Result<Vec<Voice>, SpeechError>;
}

/// Render a canned message to audio.
pub async fn speak(
    synthesizer: &dyn SpeechSynthesizer,
    message: SpeechMessage,
) -> Result<Bytes, SpeechError> {
    synthesizer.synthesize(message.into_request()).await
}

/// Used when no API key is configured.
#[derive(Debug, Clone, Default)]
pub struct DisabledSpeechSynthesizer;

#[async_trait]
impl SpeechSynthesizer for DisabledSpeechSynthesizer {
    async fn synthesize(&self, _request: SpeechRequest) -> Result<Bytes, SpeechError> {
        Err(SpeechError::MissingApiKey)
    }

    async fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        Err(SpeechError::MissingApiKey)
    }
}

#[derive(Debug, Serialize)]
struct SynthesisBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<Voice>,
}

#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    voice_id: String,
    model_id: String,
}

impl ElevenLabsClient {
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cannabis-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SpeechError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
        })
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, SpeechError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(SpeechError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, request: SpeechRequest) -> Result<Bytes, SpeechError> {
        let voice_id = request.voice_id.as_deref().unwrap_or(&self.voice_id);
        let body = SynthesisBody {
            text: &request.text,
            model_id: request.model_id.as_deref().unwrap_or(&self.model_id),
            voice_settings: request.voice_settings,
        };
        debug!(voice_id = %voice_id, chars = request.text.len(), "Synthesizing speech");

        let res = self
            .http
            .post(format!("{}/text-to-speech/{}", self.base_url, voice_id))
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        Self::check(res)
            .await?
            .bytes()
            .await
            .map_err(map_reqwest_error)
    }

    async fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let res = self
            .http
            .get(format!("{}/voices", self.base_url))
            .header("xi-api-key", self.api_key.expose_secret())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        Self::check(res)
            .await?
            .json::<VoicesResponse>()
            .await
            .map(|r| r.voices)
            .map_err(|e| SpeechError::Serde(e.to_string()))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SpeechError {
    if e.is_timeout() {
        SpeechError::Timeout
    } else {
        SpeechError::Transport(e.to_string())
    }
}
