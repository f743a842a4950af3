use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{ai_parsing_log::AiParsingLog, parsed_sale::ParsedSale};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    AppState,
    error::{ApiError, ApiJson},
};

pub const DEFAULT_LOG_LIMIT: i64 = 20;
pub const MAX_LOG_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ParseSaleRequest {
    /// Kept loose so a non-string input gets the same message as a missing one.
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ParseSaleRequest {
    fn input(&self) -> Option<&str> {
        match &self.input {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    fn model(&self) -> Option<&str> {
        self.model.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// POST /api/parse-sale
/// Quick "Name 123" format first, then the language model, then local heuristics
pub async fn parse_sale(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ParseSaleRequest>,
) -> Result<ResponseJson<ParsedSale>, ApiError> {
    let input = request
        .input()
        .ok_or_else(|| ApiError::BadRequest("Input text is required".to_string()))?;

    let parsed = state.parser().parse(input, request.model()).await;
    Ok(ResponseJson(parsed))
}

#[derive(Debug, Default, Deserialize)]
pub struct ParseLogQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// GET /api/parse-logs?limit=20
pub async fn parse_logs(
    State(state): State<AppState>,
    Query(query): Query<ParseLogQuery>,
) -> Result<ResponseJson<Vec<AiParsingLog>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
    let logs = AiParsingLog::find_recent(&state.db().pool, limit).await?;
    Ok(ResponseJson(logs))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/parse-sale", post(parse_sale))
        .route("/parse-logs", get(parse_logs))
}
