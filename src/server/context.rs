// src/server/context.rs

use crate::config::Config;
use crate::core::state::Store;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Holds all the initialized state required to run the process until shutdown.
pub struct ServerContext {
    pub store: Arc<Store>,
    pub config: Config,
    pub shutdown_tx: broadcast::Sender<()>,
    pub background_tasks: JoinSet<Result<(), anyhow::Error>>,
}
