// src/server/spawner.rs

//! Spawns the process's long-running HTTP endpoints.

use super::context::ServerContext;
use super::{metrics_server, status_server};
use anyhow::Result;
use tracing::info;

/// Spawns all background tasks into the context's JoinSet.
pub async fn spawn_all(ctx: &mut ServerContext) -> Result<()> {
    let store = &ctx.store;
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Status Endpoint ---
    let status_store = store.clone();
    let status_port = ctx.config.server.port;
    let shutdown_rx_status = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        status_server::run_status_server(status_store, status_port, shutdown_rx_status).await
    });

    // --- Metrics Server ---
    if ctx.config.metrics.enabled {
        let metrics_store = store.clone();
        let metrics_port = ctx.config.metrics.port;
        let shutdown_rx_metrics = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            metrics_server::run_metrics_server(metrics_store, metrics_port, shutdown_rx_metrics)
                .await
        });
    } else {
        info!("Prometheus metrics server is disabled in the configuration.");
    }

    info!("All background tasks have been spawned.");
    Ok(())
}
