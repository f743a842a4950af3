use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use db::models::customer::CustomerSummary;
use serde::Deserialize;

use crate::{
    AppState, fallback,
    source::{Sourced, live_or_fallback},
};

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// GET /api/customers
/// Every customer ordered by total profit, optionally filtered by a name substring
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> Sourced<Vec<CustomerSummary>> {
    let search = query.search.unwrap_or_default();
    let live = CustomerSummary::search(&state.db().pool, &search).await;

    live_or_fallback("customers", live, || {
        let needle = search.trim().to_lowercase();
        fallback::customers()
            .into_iter()
            .filter(|c| c.customer_name.to_lowercase().contains(&needle))
            .collect()
    })
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/customers", get(list_customers))
}
