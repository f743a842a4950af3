use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use db::models::analytics::{Analytics, AnalyticsPeriod};
use serde::Deserialize;

use crate::{
    AppState,
    error::ApiError,
    fallback,
    source::{Sourced, live_or_fallback},
};

pub const DEFAULT_DAYS: i64 = 30;
pub const MAX_DAYS: i64 = 365;

/// Raw query string values; parsed by hand so bad input is reported as `{error}`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub days: Option<String>,
}

impl AnalyticsQuery {
    pub fn period(&self) -> Result<AnalyticsPeriod, ApiError> {
        match self.period.as_deref().map(str::trim) {
            None | Some("") => Ok(AnalyticsPeriod::default()),
            Some(raw) => raw.to_ascii_lowercase().parse().map_err(|_| {
                ApiError::BadRequest("period must be one of daily, weekly, monthly".to_string())
            }),
        }
    }

    pub fn days(&self) -> Result<i64, ApiError> {
        let Some(raw) = self.days.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
            return Ok(DEFAULT_DAYS);
        };
        raw.parse::<i64>()
            .ok()
            .filter(|d| (1..=MAX_DAYS).contains(d))
            .ok_or_else(|| ApiError::BadRequest(format!("days must be between 1 and {}", MAX_DAYS)))
    }
}

/// GET /api/analytics?period=daily&days=30
pub async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Sourced<Analytics>, ApiError> {
    let period = query.period()?;
    let days = query.days()?;

    let live = Analytics::load(&state.db().pool, period, days).await;
    Ok(live_or_fallback("analytics", live, fallback::analytics))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/analytics", get(analytics))
}
