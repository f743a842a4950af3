use axum::{Router, extract::State, routing::get};
use chrono::Utc;
use db::models::dashboard::DashboardStats;

use crate::{
    AppState, fallback,
    source::{Sourced, live_or_fallback},
};

/// GET /api/dashboard-stats
pub async fn dashboard_stats(State(state): State<AppState>) -> Sourced<DashboardStats> {
    let today = Utc::now().date_naive();
    live_or_fallback(
        "dashboard stats",
        DashboardStats::load(&state.db().pool, today).await,
        fallback::dashboard_stats,
    )
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/dashboard-stats", get(dashboard_stats))
}
