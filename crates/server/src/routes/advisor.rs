use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::get,
};
use services::services::business_advisor::{BusinessInsight, CustomerAnalysis};

use crate::AppState;

/// GET /api/ai-insights
/// Never fails; a model outage yields a single "unavailable" insight
pub async fn ai_insights(State(state): State<AppState>) -> ResponseJson<Vec<BusinessInsight>> {
    ResponseJson(state.advisor().generate_insights().await)
}

/// GET /api/customer-analysis
pub async fn customer_analysis(State(state): State<AppState>) -> ResponseJson<Vec<CustomerAnalysis>> {
    ResponseJson(state.advisor().analyze_customers().await)
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/ai-insights", get(ai_insights))
        .route("/customer-analysis", get(customer_analysis))
}
