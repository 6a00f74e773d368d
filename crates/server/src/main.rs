use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelfline_core::config::{load_config, validate_config};

use shelfline_server::api::routes::build_router;
use shelfline_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("SHELFLINE_CONFIG").unwrap_or_else(|_| "shelfline.toml".to_string());
    let config = load_config(Path::new(&config_path))
        .with_context(|| format!("loading config from {config_path}"))?;
    validate_config(&config)?;

    let addr = SocketAddr::from((config.server.host, config.server.port));
    let state = AppState::new(config)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "shelfline listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install shutdown handler");
    }
}
