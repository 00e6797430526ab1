//! `barangay serve`

use crate::db;
use anyhow::{Context, Result};
use barangay_business::{SanctionSweeper, ServiceContext};
use barangay_config::PortalConfig;
use barangay_web::AppState;
use tokio::net::TcpListener;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Ctrl-C handler unavailable; serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run(config: &PortalConfig) -> Result<()> {
    let db = db::connect(config).await?;
    let ctx = ServiceContext::with_settings(&db, db::service_settings(config));

    let sweeper = SanctionSweeper::new(ctx.clone(), config.sanctions.sweep_interval()).spawn();

    let state = AppState::new(ctx, config.security.session_cookie.clone());
    let listener = TcpListener::bind(config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    tracing::info!(listen = %config.server.listen, "🚀 Barangay portal listening");

    let served = barangay_web::serve(listener, state, shutdown_signal()).await;

    sweeper.abort();
    db.close().await;
    tracing::info!("Server stopped");

    served.context("HTTP server failed")
}
