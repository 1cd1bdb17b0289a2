use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use eli_backend::core::config::{AppPaths, ConfigService};
use eli_backend::core::logging;
use eli_backend::server;
use eli_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    let config = ConfigService::new(paths.clone());
    let settings = config
        .load()
        .with_context(|| format!("Failed to load config from {}", config.config_path().display()))?;

    logging::init(&paths.log_dir, &settings.logging.level);
    tracing::info!("Loaded settings: {:?}", settings);

    let bind_addr = settings.server.bind_addr();
    let state = AppState::initialize(settings)?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!(
        "Listening on {} (provider: {}, model: {})",
        addr,
        state.llm.name(),
        state.settings.llm.model
    );

    let app: Router = server::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
