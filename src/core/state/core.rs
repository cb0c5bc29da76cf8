// src/core/state/core.rs

//! Defines `Store`, which constructs and owns every repository, cache and the
//! background task tying the two connection indices together.

use super::stats::StoreStats;
use crate::config::Config;
use crate::core::bridge::{ConnectionBridge, DEFAULT_BRIDGE_CAPACITY};
use crate::core::cache::{InMemoryChannelCache, InMemoryThingCache};
use crate::core::errors::StoreError;
use crate::core::repository::ThingRepository;
use crate::core::storage::{InMemoryChannelRepository, InMemoryThingRepository};
use crate::core::tasks::connection_sync::ConnectionSyncTask;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// An owned, self-contained store instance.
///
/// Constructing a `Store` spawns the connection sync task on the current tokio
/// runtime, so every constructor panics when called outside one. `shutdown`
/// stops the task after draining the bridge.
pub struct Store {
    pub things: Arc<InMemoryThingRepository>,
    pub channels: Arc<InMemoryChannelRepository>,
    pub channel_cache: Arc<InMemoryChannelCache>,
    pub thing_cache: Arc<InMemoryThingCache>,
    bridge: ConnectionBridge,
    shutdown_tx: broadcast::Sender<()>,
    sync_task: Mutex<Option<JoinHandle<()>>>,
}

impl Store {
    /// Creates a store with the default bridge capacity.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new() -> Self {
        Self::with_bridge_capacity(DEFAULT_BRIDGE_CAPACITY)
    }

    /// Creates a store configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_bridge_capacity(config.bridge_capacity)
    }

    /// Creates a store whose bridge holds at most `capacity` pending events.
    pub fn with_bridge_capacity(capacity: usize) -> Self {
        let (bridge, bridge_rx) = ConnectionBridge::new(capacity);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let things = Arc::new(InMemoryThingRepository::new());
        let thing_repo: Arc<dyn ThingRepository> = things.clone();
        let channels = Arc::new(InMemoryChannelRepository::new(thing_repo, bridge.clone()));

        let sync_task = ConnectionSyncTask::new(things.clone(), bridge_rx);
        let handle = tokio::spawn(sync_task.run(shutdown_rx));
        info!("Store initialized with bridge capacity {}.", capacity.max(1));

        Self {
            things,
            channels,
            channel_cache: Arc::new(InMemoryChannelCache::new()),
            thing_cache: Arc::new(InMemoryThingCache::new()),
            bridge,
            shutdown_tx,
            sync_task: Mutex::new(Some(handle)),
        }
    }

    /// Waits until every connection change made so far is visible on the
    /// thing side.
    pub async fn sync(&self) -> Result<(), StoreError> {
        self.bridge.flush().await
    }

    /// The number of connection events waiting to be applied.
    pub fn bridge_backlog(&self) -> usize {
        self.bridge.backlog()
    }

    /// A point-in-time snapshot of entity and connection counts.
    pub async fn stats(&self) -> StoreStats {
        StoreStats {
            things: self.things.len().await,
            channels: self.channels.len().await,
            connections: self.channels.connection_count().await,
            bridge_backlog: self.bridge_backlog(),
        }
    }

    /// Signals the sync task to stop and waits up to `wait` for it to drain
    /// the bridge. A task still running after that is aborted.
    pub async fn shutdown(&self, wait: Duration) {
        let Some(mut handle) = self.sync_task.lock().take() else {
            return;
        };
        if self.shutdown_tx.send(()).is_err() {
            warn!("Connection sync task was already gone at shutdown.");
        }

        match tokio::time::timeout(wait, &mut handle).await {
            Ok(Ok(())) => info!("Store shut down cleanly."),
            Ok(Err(e)) => warn!("Connection sync task failed during shutdown: {}", e),
            Err(_) => {
                warn!(
                    "Connection sync task did not finish within {:?}; aborting it.",
                    wait
                );
                handle.abort();
            }
        }
    }

    /// Whether the sync task has been stopped or has exited on its own.
    pub fn is_stopped(&self) -> bool {
        self.sync_task
            .lock()
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }
}
