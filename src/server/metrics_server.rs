// src/server/metrics_server.rs

use crate::core::metrics::{self, gather_metrics};
use crate::core::state::Store;
use anyhow::{Context, Result};
use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Handles HTTP requests to the /metrics endpoint.
///
/// It updates the store gauges before gathering all registered metrics
/// and encoding them in the Prometheus text format.
async fn metrics_handler(store: Arc<Store>) -> impl IntoResponse {
    let stats = store.stats().await;
    metrics::THINGS_STORED.set(stats.things as f64);
    metrics::CHANNELS_STORED.set(stats.channels as f64);
    metrics::CONNECTIONS_STORED.set(stats.connections as f64);
    metrics::BRIDGE_BACKLOG.set(stats.bridge_backlog as f64);

    let body = gather_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        body,
    )
}

/// Runs a simple HTTP server to expose Prometheus metrics on /metrics.
pub async fn run_metrics_server(
    store: Arc<Store>,
    port: u16,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let app = Router::new().route("/metrics", get(move || metrics_handler(store.clone())));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics server on port {port}"))?;
    info!(
        "Prometheus metrics server listening on http://{}/metrics",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
            info!("Metrics server shutting down.");
        })
        .await
        .context("Metrics server failed")
}
