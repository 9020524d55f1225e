//! # guardian-api: Binary Entry Point
//!
//! Loads the active schema named by `GUARDIAN_SCHEMA` and starts the Axum
//! HTTP server on `PORT` (default 8080).

use guardian_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let state = AppState::load(&config).map_err(|e| {
        tracing::error!("Schema load failed: {e}");
        e
    })?;

    let app = guardian_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("guardian API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
