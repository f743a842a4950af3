use std::sync::Arc;

use axum::Router;
use db::DBService;
use services::services::{
    business_advisor::BusinessAdvisor, language_model::LanguageModel, sale_parser::SaleParser,
    sale_recorder::SaleRecorder, speech::SpeechSynthesizer,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod fallback;
pub mod routes;
pub mod source;

use config::Config;

/// Service objects shared by every handler, built once at startup.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    parser: Arc<SaleParser>,
    advisor: Arc<BusinessAdvisor>,
    recorder: Arc<SaleRecorder>,
    speech: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    pub fn new(
        db: DBService,
        language_model: Arc<dyn LanguageModel>,
        speech: Arc<dyn SpeechSynthesizer>,
        config: &Config,
    ) -> Self {
        let pool = db.pool.clone();
        Self {
            parser: Arc::new(SaleParser::new(
                pool.clone(),
                language_model.clone(),
                config.parser_model.clone(),
            )),
            advisor: Arc::new(BusinessAdvisor::new(
                pool.clone(),
                language_model,
                config.advisor_model.clone(),
                config.parser_model.clone(),
            )),
            recorder: Arc::new(SaleRecorder::new(
                pool,
                config.default_cost_per_gram,
                config.simulate_sales_when_offline,
            )),
            speech,
            db,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn parser(&self) -> &SaleParser {
        &self.parser
    }

    pub fn advisor(&self) -> &BusinessAdvisor {
        &self.advisor
    }

    pub fn recorder(&self) -> &SaleRecorder {
        &self.recorder
    }

    pub fn speech(&self) -> &dyn SpeechSynthesizer {
        self.speech.as_ref()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::router(&state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
