//! Process configuration read from the environment (and `.env`, if present).

use std::{str::FromStr, sync::Arc, time::Duration};

use secrecy::SecretString;
use services::services::{
    language_model::{DisabledLanguageModel, LanguageModel, LanguageModelError},
    openrouter::{self, OpenRouterClient},
    sale_recorder::DEFAULT_COST_PER_GRAM,
    speech::{self, DisabledSpeechSynthesizer, ElevenLabsClient, SpeechError, SpeechSynthesizer},
};
use thiserror::Error;
use tracing::warn;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://cannabis_tracker.db";
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub openrouter_api_key: Option<SecretString>,
    pub openrouter_base_url: String,
    pub parser_model: String,
    pub advisor_model: String,
    pub elevenlabs_api_key: Option<SecretString>,
    pub elevenlabs_base_url: String,
    pub elevenlabs_voice_id: String,
    pub elevenlabs_model_id: String,
    pub remote_timeout: Duration,
    pub default_cost_per_gram: f64,
    pub simulate_sales_when_offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            openrouter_api_key: None,
            openrouter_base_url: openrouter::DEFAULT_BASE_URL.to_string(),
            parser_model: openrouter::DEFAULT_PARSER_MODEL.to_string(),
            advisor_model: openrouter::DEFAULT_ADVISOR_MODEL.to_string(),
            elevenlabs_api_key: None,
            elevenlabs_base_url: speech::DEFAULT_BASE_URL.to_string(),
            elevenlabs_voice_id: speech::DEFAULT_VOICE_ID.to_string(),
            elevenlabs_model_id: speech::DEFAULT_MODEL_ID.to_string(),
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            default_cost_per_gram: DEFAULT_COST_PER_GRAM,
            simulate_sales_when_offline: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Unset and blank values take the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let remote_timeout_secs: u64 = parse(&get, "REMOTE_TIMEOUT_SECS", DEFAULT_REMOTE_TIMEOUT_SECS)?;
        if remote_timeout_secs == 0 {
            return Err(invalid("REMOTE_TIMEOUT_SECS", "0", "must be at least 1"));
        }

        let default_cost_per_gram: f64 = parse(&get, "DEFAULT_COST_PER_GRAM", DEFAULT_COST_PER_GRAM)?;
        if !default_cost_per_gram.is_finite() || default_cost_per_gram <= 0.0 {
            return Err(invalid(
                "DEFAULT_COST_PER_GRAM",
                &default_cost_per_gram.to_string(),
                "must be greater than 0",
            ));
        }

        let simulate_sales_when_offline = match get("SIMULATE_SALES_WHEN_OFFLINE") {
            None => defaults.simulate_sales_when_offline,
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| invalid("SIMULATE_SALES_WHEN_OFFLINE", &raw, "expected true or false"))?,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse(&get, "PORT", DEFAULT_PORT)?,
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            openrouter_api_key: get("OPENROUTER_API_KEY").map(SecretString::from),
            openrouter_base_url: get("OPENROUTER_BASE_URL").unwrap_or(defaults.openrouter_base_url),
            parser_model: get("PARSER_MODEL").unwrap_or(defaults.parser_model),
            advisor_model: get("ADVISOR_MODEL").unwrap_or(defaults.advisor_model),
            elevenlabs_api_key: get("ELEVENLABS_API_KEY").map(SecretString::from),
            elevenlabs_base_url: get("ELEVENLABS_BASE_URL").unwrap_or(defaults.elevenlabs_base_url),
            elevenlabs_voice_id: get("ELEVENLABS_VOICE_ID").unwrap_or(defaults.elevenlabs_voice_id),
            elevenlabs_model_id: get("ELEVENLABS_MODEL_ID").unwrap_or(defaults.elevenlabs_model_id),
            remote_timeout: Duration::from_secs(remote_timeout_secs),
            default_cost_per_gram,
            simulate_sales_when_offline,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// OpenRouter when a key is configured, otherwise a model that always
    /// fails so every caller takes its fallback path.
    pub fn language_model(&self) -> Result<Arc<dyn LanguageModel>, LanguageModelError> {
        match &self.openrouter_api_key {
            Some(key) => Ok(Arc::new(OpenRouterClient::new(
                key.clone(),
                self.openrouter_base_url.clone(),
                self.remote_timeout,
            )?)),
            None => {
                warn!("OPENROUTER_API_KEY not set, AI parsing and insights will use fallbacks");
                Ok(Arc::new(DisabledLanguageModel))
            }
        }
    }

    pub fn speech_synthesizer(&self) -> Result<Arc<dyn SpeechSynthesizer>, SpeechError> {
        match &self.elevenlabs_api_key {
            Some(key) => Ok(Arc::new(
                ElevenLabsClient::new(key.clone(), self.elevenlabs_base_url.clone(), self.remote_timeout)?
                    .with_voice(self.elevenlabs_voice_id.clone())
                    .with_model(self.elevenlabs_model_id.clone()),
            )),
            None => {
                warn!("ELEVENLABS_API_KEY not set, text-to-speech is disabled");
                Ok(Arc::new(DisabledSpeechSynthesizer))
            }
        }
    }
}

fn invalid(var: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    }
}

fn parse<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| invalid(var, &raw, "not a valid value")),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.database_url, "sqlite://cannabis_tracker.db");
        assert_eq!(config.parser_model, "openai/gpt-4o-mini");
        assert_eq!(config.advisor_model, "openai/gpt-4o");
        assert_eq!(config.elevenlabs_voice_id, "j7KV53NgP8U4LRS2k2Gs");
        assert_eq!(config.remote_timeout, Duration::from_secs(60));
        assert_eq!(config.default_cost_per_gram, 6.0);
        assert!(config.simulate_sales_when_offline);
        assert!(config.openrouter_api_key.is_none());
    }

    #[test]
    fn values_are_read_and_blank_means_unset() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("HOST", " "),
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("DEFAULT_COST_PER_GRAM", "7.25"),
            ("SIMULATE_SALES_WHEN_OFFLINE", "No"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(
            config.openrouter_api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("sk-or-test".to_string())
        );
        assert_eq!(config.default_cost_per_gram, 7.25);
        assert!(!config.simulate_sales_when_offline);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let cases = [
            ("PORT", "eighty"),
            ("REMOTE_TIMEOUT_SECS", "0"),
            ("DEFAULT_COST_PER_GRAM", "-1"),
            ("SIMULATE_SALES_WHEN_OFFLINE", "maybe"),
        ];
        for (var, value) in cases {
            let err = config_from(&[(var, value)]).unwrap_err();
            assert!(err.to_string().contains(var), "{err}");
        }
    }

    #[test]
    fn secrets_are_not_printed() {
        let config = config_from(&[("ELEVENLABS_API_KEY", "xi-secret")]).unwrap();
        assert!(!format!("{:?}", config).contains("xi-secret"));
    }
}
