use axum::{Router, extract::State, routing::get};
use db::models::daily_profit::{self, DailyProfit, ProfitChartPoint};

use crate::{
    AppState, fallback,
    source::{Sourced, live_or_fallback},
};

pub const CHART_DAYS: i64 = 30;

/// GET /api/profit-chart
/// Daily profit for the last 30 days, oldest first
pub async fn profit_chart(State(state): State<AppState>) -> Sourced<Vec<ProfitChartPoint>> {
    let live = DailyProfit::last_days(&state.db().pool, CHART_DAYS)
        .await
        .map(|days| daily_profit::chart_points(&days));
    live_or_fallback("profit chart", live, fallback::profit_chart)
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/profit-chart", get(profit_chart))
}
