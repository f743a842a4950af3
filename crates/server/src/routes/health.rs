use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::Serialize;
use services::services::database_validator::{DatabaseValidator, ValidationResult};
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

/// GET /api/health
/// Always 200: the API keeps serving fallback data while the store is down
pub async fn health(State(state): State<AppState>) -> ResponseJson<HealthStatus> {
    let status = match DatabaseValidator::new(state.db().pool.clone()).validate().await {
        Ok(result) => HealthStatus {
            status: if result.is_ok() { "ok" } else { "degraded" },
            database: result.summary(),
            validation: Some(result),
        },
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            HealthStatus {
                status: "degraded",
                database: "Database unavailable".to_string(),
                validation: None,
            }
        }
    };
    ResponseJson(status)
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/health", get(health))
}
