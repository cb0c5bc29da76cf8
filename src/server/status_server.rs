// src/server/status_server.rs

//! A read-only HTTP endpoint reporting liveness and store counts.

use crate::core::state::Store;
use anyhow::{Context, Result};
use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

async fn health_handler(store: Arc<Store>) -> impl IntoResponse {
    if store.is_stopped() {
        (StatusCode::SERVICE_UNAVAILABLE, "stopping")
    } else {
        (StatusCode::OK, "ok")
    }
}

async fn stats_handler(store: Arc<Store>) -> impl IntoResponse {
    Json(store.stats().await)
}

/// Builds the router serving `/health` and `/stats`.
pub fn router(store: Arc<Store>) -> Router {
    let health_store = store.clone();
    Router::new()
        .route("/health", get(move || health_handler(health_store.clone())))
        .route("/stats", get(move || stats_handler(store.clone())))
}

/// Serves the status router on `port` until shutdown.
pub async fn run_status_server(
    store: Arc<Store>,
    port: u16,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind status server on port {port}"))?;
    info!("Status endpoint listening on http://{}", addr);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
            info!("Status endpoint shutting down.");
        })
        .await
        .context("Status server failed")
}
