// src/server/lifecycle.rs

//! Waits for a stop signal or a failing task and handles graceful shutdown.

use super::context::ServerContext;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

/// Blocks until SIGINT, SIGTERM or a background task failure, then stops the
/// endpoints and the store within the configured stop wait time.
pub async fn run(mut ctx: ServerContext) {
    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to register signal handlers: {}. Shutting down.", e);
            shutdown(ctx).await;
            return;
        }
    };

    tokio::select! {
        biased;

        _ = sigint.recv() => {
            info!("SIGINT received, initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received, initiating graceful shutdown.");
        }
        Some(res) = ctx.background_tasks.join_next() => {
            match res {
                Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                Ok(Err(e)) => error!("CRITICAL: Background task failed: {}. Shutting down.", e),
                Err(e) => error!("CRITICAL: Background task panicked: {e:?}. Shutting down."),
            }
        }
    }

    shutdown(ctx).await;
}

async fn shutdown(mut ctx: ServerContext) {
    let wait = ctx.config.server.stop_wait_time;

    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        warn!("No background task was listening for the shutdown signal.");
    }

    ctx.store.shutdown(wait).await;

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(wait, async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
        ctx.background_tasks.shutdown().await;
    };
    info!("Shutdown complete.");
}
