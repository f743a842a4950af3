use axum::Router;

use crate::AppState;

pub mod advisor;
pub mod analytics;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod models;
pub mod parse_sale;
pub mod profit_chart;
pub mod sales;
pub mod strains;
pub mod tts;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router(state))
        .merge(dashboard::router(state))
        .merge(customers::router(state))
        .merge(strains::router(state))
        .merge(analytics::router(state))
        .merge(profit_chart::router(state))
        .merge(sales::router(state))
        .merge(parse_sale::router(state))
        .merge(advisor::router(state))
        .merge(tts::router(state))
        .merge(models::router(state))
}
