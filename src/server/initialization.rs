// src/server/initialization.rs

//! Builds the store and validates the collaborator settings before any task starts.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::Store;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all components before entering the lifecycle loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    check_tls_material(&config)?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let store = Arc::new(Store::from_config(&config));
    info!("Store initialized.");

    Ok(ServerContext {
        store,
        config,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

fn log_startup_info(config: &Config) {
    info!("Thingstore version {}", env!("THINGSTORE_BUILD_VERSION"));
    info!(
        "Bridge capacity: {}, stop wait time: {:?}",
        config.bridge_capacity, config.server.stop_wait_time
    );
}

/// The certificate and key are consumed by the relay sharing this
/// configuration; make sure they are readable before starting.
fn check_tls_material(config: &Config) -> Result<()> {
    if !config.server.tls_enabled() {
        info!("No TLS material configured.");
        return Ok(());
    }
    for path in [&config.server.cert_path, &config.server.key_path] {
        std::fs::metadata(Path::new(path))
            .with_context(|| format!("TLS file '{path}' is not accessible"))?;
    }
    info!(
        "TLS material found: cert '{}', key '{}'.",
        config.server.cert_path, config.server.key_path
    );
    Ok(())
}
