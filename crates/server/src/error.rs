use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::services::{sale_recorder::SaleError, speech::SpeechError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Speech(#[from] SpeechError),
    #[error("voice listing failed: {0}")]
    VoiceListing(SpeechError),
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        match err {
            SaleError::Validation(message) => Self::BadRequest(message),
            SaleError::Database(e) => Self::Database(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Database(e) => {
                error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            ApiError::Speech(e) => {
                error!(error = %e, "Speech synthesis failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate speech".to_string())
            }
            ApiError::VoiceListing(e) => {
                error!(error = %e, "Voice listing failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch voices".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `Json` whose rejections are reported as `ApiError::BadRequest`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
