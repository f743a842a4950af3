use anyhow::Context;
use db::DBService;
use server::{AppState, build_router, config::Config};
use services::services::database_validator::DatabaseValidator;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,server=info,services=info,db=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;

    let db = match DBService::new(&config.database_url).await {
        Ok(db) => {
            tracing::info!("Database: connected");
            db
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Database: not available, serving fallback data until it comes back"
            );
            DBService::new_lazy(&config.database_url).context("invalid DATABASE_URL")?
        }
    };

    match DatabaseValidator::new(db.pool.clone()).validate().await {
        Ok(result) if result.is_ok() => tracing::info!("{}", result.summary()),
        Ok(result) => tracing::warn!("{}", result.summary()),
        Err(e) => tracing::warn!(error = %e, "Database validation skipped"),
    }

    let language_model = config
        .language_model()
        .context("failed to build language model client")?;
    let speech = config
        .speech_synthesizer()
        .context("failed to build speech client")?;

    let state = AppState::new(db, language_model, speech, &config);
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
