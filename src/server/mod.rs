// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod context;
mod initialization;
mod lifecycle;
mod metrics_server;
mod spawner;
pub mod status_server;

pub use context::ServerContext;

/// The main process startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Initialize the store and validate collaborator settings.
    let mut server_context = initialization::setup(config).await?;

    // 2. Spawn the HTTP endpoints.
    spawner::spawn_all(&mut server_context).await?;

    // 3. Wait for a stop signal or a failing task, then shut down gracefully.
    lifecycle::run(server_context).await;

    Ok(())
}
