// src/core/tasks/connection_sync.rs

use crate::core::bridge::BridgeEvent;
use crate::core::storage::InMemoryThingRepository;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// The long-lived consumer of the connection bridge. It applies each event to
/// the thing-side connection index, in emission order, under the thing
/// repository's own lock and nothing else.
pub struct ConnectionSyncTask {
    /// The repository whose connection index is kept in sync.
    pub things: Arc<InMemoryThingRepository>,
    /// The consuming half of the connection bridge.
    pub rx: mpsc::Receiver<BridgeEvent>,
}

impl ConnectionSyncTask {
    pub fn new(things: Arc<InMemoryThingRepository>, rx: mpsc::Receiver<BridgeEvent>) -> Self {
        Self { things, rx }
    }

    /// Runs the main loop until a shutdown signal arrives or every producer
    /// is gone. On shutdown, events already queued are still applied.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        debug!("Connection sync task started.");
        loop {
            tokio::select! {
                maybe_event = self.rx.recv() => {
                    match maybe_event {
                        Some(event) => self.handle(event).await,
                        None => {
                            info!("Connection bridge closed, connection sync task exiting.");
                            return;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Connection sync task shutting down.");
                    self.rx.close();
                    let mut drained = 0usize;
                    while let Some(event) = self.rx.recv().await {
                        self.handle(event).await;
                        drained += 1;
                    }
                    debug!("Drained {} bridge events on shutdown.", drained);
                    return;
                }
            }
        }
    }

    async fn handle(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::Connection(event) => self.things.apply_connection_event(event).await,
            BridgeEvent::Flush(ack) => {
                // The waiter may have given up; nothing to do then.
                let _ = ack.send(());
            }
        }
    }
}
