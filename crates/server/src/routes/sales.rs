use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::post,
};
use serde::Serialize;
use services::services::{
    business_advisor::SaleHighlights,
    sale_recorder::{RecordedSale, SaleSubmission},
};

use crate::{
    AppState,
    error::{ApiError, ApiJson},
    source::{DataSource, Sourced},
};

/// POST /api/sales
/// Validate and record a sale. Cost and profit are derived server-side.
pub async fn create_sale(
    State(state): State<AppState>,
    ApiJson(submission): ApiJson<SaleSubmission>,
) -> Result<Sourced<RecordedSale>, ApiError> {
    let recorded = state.recorder().record(&submission).await?;
    let source = if recorded.simulated {
        DataSource::Fallback
    } else {
        DataSource::Live
    };
    Ok(Sourced(source, recorded))
}

#[derive(Debug, Serialize)]
pub struct Celebration {
    pub message: String,
}

/// POST /api/sales/celebration
pub async fn celebrate_sale(
    State(state): State<AppState>,
    ApiJson(sale): ApiJson<SaleHighlights>,
) -> ResponseJson<Celebration> {
    let message = state.advisor().celebrate_sale(&sale).await;
    ResponseJson(Celebration { message })
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/sales", post(create_sale))
        .route("/sales/celebration", post(celebrate_sale))
}
