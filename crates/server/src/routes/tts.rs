use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Json as ResponseJson},
    routing::post,
};
use serde::Deserialize;
use serde_json::Value;
use services::services::{
    business_advisor::SaleHighlights,
    speech::{self, SpeechMessage, Voice},
};

use crate::{
    AppState,
    error::{ApiError, ApiJson},
};

#[derive(Debug, Default, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AlertData {
    #[serde(alias = "customerName")]
    customer_name: String,
}

impl TtsRequest {
    pub fn into_message(self) -> Result<SpeechMessage, ApiError> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Text is required".to_string()))?;

        match self.kind.as_deref().unwrap_or("general") {
            "sale_confirmation" => {
                let sale = self
                    .data
                    .and_then(|data| serde_json::from_value::<SaleHighlights>(data).ok())
                    .ok_or_else(|| {
                        ApiError::BadRequest("data must describe the sale".to_string())
                    })?;
                Ok(SpeechMessage::SaleConfirmation(sale))
            }
            "business_insight" => Ok(SpeechMessage::BusinessInsight(text)),
            "customer_alert" => {
                let alert = self
                    .data
                    .and_then(|data| serde_json::from_value::<AlertData>(data).ok())
                    .ok_or_else(|| {
                        ApiError::BadRequest("data.customerName is required".to_string())
                    })?;
                Ok(SpeechMessage::CustomerAlert {
                    customer_name: alert.customer_name,
                    message: text,
                })
            }
            _ => Ok(SpeechMessage::General(text)),
        }
    }
}

/// POST /api/tts
/// Returns MPEG audio
pub async fn synthesize(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TtsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = request.into_message()?;
    let audio = speech::speak(state.speech(), message).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        audio,
    ))
}

/// GET /api/tts
pub async fn list_voices(State(state): State<AppState>) -> Result<ResponseJson<Vec<Voice>>, ApiError> {
    let voices = state.speech().voices().await.map_err(ApiError::VoiceListing)?;
    Ok(ResponseJson(voices))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/tts", post(synthesize).get(list_voices))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(body: Value) -> TtsRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn missing_text_is_rejected() {
        let err = request(json!({"type": "general"})).into_message().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Text is required"));
    }

    #[test]
    fn unknown_type_is_general() {
        let message = request(json!({"text": "hi", "type": "shout"})).into_message().unwrap();
        assert_eq!(message, SpeechMessage::General("hi".to_string()));
    }

    #[test]
    fn customer_alert_reads_camel_case_name() {
        let message = request(json!({
            "text": "hasn't been by in a while",
            "type": "customer_alert",
            "data": {"customerName": "Ryan"}
        }))
        .into_message()
        .unwrap();

        assert_eq!(
            message,
            SpeechMessage::CustomerAlert {
                customer_name: "Ryan".to_string(),
                message: "hasn't been by in a while".to_string(),
            }
        );
    }

    #[test]
    fn sale_confirmation_needs_sale_data() {
        let err = request(json!({"text": "sold", "type": "sale_confirmation"}))
            .into_message()
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let message = request(json!({
            "text": "sold",
            "type": "sale_confirmation",
            "data": {"customer_name": "Jay", "strain_name": "Stardust", "quantity_grams": 3.5, "sale_price": 60.0, "profit": 39.0}
        }))
        .into_message()
        .unwrap();
        assert!(matches!(message, SpeechMessage::SaleConfirmation(ref s) if s.customer_name == "Jay"));
    }
}
