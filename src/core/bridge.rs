// src/core/bridge.rs

//! Defines the connection bridge: the single event path from the channel
//! repository to the thing repository.
//!
//! The channel side never touches the thing side's lock. Instead it emits
//! `ConnectionEvent`s here and the thing side applies them from a dedicated
//! consumer task, strictly in emission order.

use crate::core::errors::StoreError;
use crate::core::metrics;
use crate::core::model::Thing;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// The default capacity of the bridge channel. Large enough to absorb bursts of
/// connects without making channel-side callers wait on the consumer.
pub const DEFAULT_BRIDGE_CAPACITY: usize = 1024;

/// A change to the channel/thing relation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEvent {
    pub channel_id: String,
    /// The thing snapshot for connects, an id-only thing for disconnects and
    /// `None` when every pair of the channel must be dropped.
    pub thing: Option<Thing>,
    pub connected: bool,
}

impl ConnectionEvent {
    pub fn connected(channel_id: impl Into<String>, thing: Thing) -> Self {
        Self {
            channel_id: channel_id.into(),
            thing: Some(thing),
            connected: true,
        }
    }

    pub fn disconnected(channel_id: impl Into<String>, thing_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            thing: Some(Thing {
                id: thing_id.into(),
                ..Default::default()
            }),
            connected: false,
        }
    }

    /// Emitted when a channel is removed: drop every pair of that channel.
    pub fn channel_removed(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            thing: None,
            connected: false,
        }
    }

    /// A label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match (self.connected, &self.thing) {
            (true, _) => "connect",
            (false, Some(_)) => "disconnect",
            (false, None) => "channel_removed",
        }
    }
}

/// Everything that travels over the bridge.
#[derive(Debug)]
pub enum BridgeEvent {
    Connection(ConnectionEvent),
    /// A barrier acknowledged once every event queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

/// The producing half of the bridge, held by the channel repository.
#[derive(Debug, Clone)]
pub struct ConnectionBridge {
    sender: mpsc::Sender<BridgeEvent>,
}

impl ConnectionBridge {
    /// Creates a new bridge and returns the receiver for the consumer task.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<BridgeEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queues a connection event. Waits for room when the bridge is full.
    pub async fn emit(&self, event: ConnectionEvent) -> Result<(), StoreError> {
        let kind = event.kind();
        debug!(
            "Bridge: emitting {} event for channel '{}'.",
            kind, event.channel_id
        );
        self.sender
            .send(BridgeEvent::Connection(event))
            .await
            .map_err(|_| StoreError::BridgeClosed)?;
        metrics::BRIDGE_EVENTS_EMITTED_TOTAL
            .with_label_values(&[kind])
            .inc();
        Ok(())
    }

    /// Waits until every event emitted before this call has been applied on
    /// the thing side.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.sender
            .send(BridgeEvent::Flush(ack_tx))
            .await
            .map_err(|_| StoreError::BridgeClosed)?;
        ack_rx.await?;
        Ok(())
    }

    /// Checks if the consumer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// The number of events queued but not yet taken by the consumer.
    pub fn backlog(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}
