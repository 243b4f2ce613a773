use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use estatevoice::config::AppConfig;
use estatevoice::db;
use estatevoice::handlers;
use estatevoice::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(
        !config.admin_token.is_empty(),
        "ADMIN_TOKEN must not be empty"
    );
    if config.admin_token == "changeme" {
        tracing::warn!("ADMIN_TOKEN is the default, set it before exposing the admin API");
    }

    let conn = db::init_db(&config.database_url)?;

    tracing::info!(
        confirm_before_complete = config.confirm_before_complete,
        session_ttl_minutes = config.session_ttl_minutes,
        "dialogue engine configured"
    );

    let state = Arc::new(AppState::new(conn, config.clone()));

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
