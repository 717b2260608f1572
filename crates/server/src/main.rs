mod bootstrap;
mod chat;
mod health;
mod sessions;

use std::time::Duration;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use estately_core::config::{AppConfig, LoadOptions};
use tracing::{info, warn};

use crate::bootstrap::AppState;

fn init_logging(config: &AppConfig) {
    use estately_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/health", get(health::health))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    let address =
        format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.server.started",
        bind_address = %address,
        session_backend = app.session_store.backend_name(),
        "estately-server started"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, router(app.state()))
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::signal::ctrl_c().await?;
    info!(event_name = "system.server.stopping", "shutdown signal received, draining");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!(
                event_name = "system.server.drain_timeout",
                grace_secs = grace.as_secs(),
                "open connections did not drain in time, exiting"
            );
        }
    }

    Ok(())
}
