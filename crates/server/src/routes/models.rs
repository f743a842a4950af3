use axum::{Router, response::Json as ResponseJson, routing::get};
use services::services::openrouter::{AVAILABLE_MODELS, ModelInfo};

use crate::AppState;

/// GET /api/models
pub async fn list_models() -> ResponseJson<&'static [ModelInfo]> {
    ResponseJson(AVAILABLE_MODELS)
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/models", get(list_models))
}
