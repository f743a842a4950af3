use axum::{Router, extract::State, routing::get};
use db::models::strain::Strain;

use crate::{
    AppState, fallback,
    source::{Sourced, live_or_fallback},
};

/// GET /api/strains
pub async fn list_strains(State(state): State<AppState>) -> Sourced<Vec<Strain>> {
    live_or_fallback("strains", Strain::find_all(&state.db().pool).await, fallback::strains)
}

/// GET /api/strains/low-stock
/// Strains at or below their reorder point
pub async fn low_stock_strains(State(state): State<AppState>) -> Sourced<Vec<Strain>> {
    live_or_fallback(
        "low stock",
        Strain::find_low_stock(&state.db().pool).await,
        || fallback::strains().into_iter().filter(Strain::is_low_stock).collect(),
    )
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/strains", get(list_strains))
        .route("/strains/low-stock", get(low_stock_strains))
}
