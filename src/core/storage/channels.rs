// src/core/storage/channels.rs

//! The in-memory channel repository and the channel side of the connection index.
//!
//! Lock discipline: the channel lock is never held while calling into the
//! thing repository. Thing lookups happen first, then the channel lock is
//! taken to validate and record. Changes reach the thing side only through
//! the connection bridge, emitted while the channel lock is held so the event
//! order matches the order of index mutations.

use super::table::EntityTable;
use crate::core::bridge::{ConnectionBridge, ConnectionEvent};
use crate::core::errors::StoreError;
use crate::core::metrics;
use crate::core::model::{Channel, Connection};
use crate::core::page::{ChannelsPage, PageMetadata};
use crate::core::repository::{ChannelRepository, ThingRepository};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct ChannelsState {
    table: EntityTable<Channel>,
    /// Thing id -> ids of the channels it is connected to, lowest first.
    /// Records are always read back from `table`.
    connections: HashMap<String, BTreeSet<String>>,
}

impl ChannelsState {
    /// The channel ids recorded for a thing, or `Authorization` if there are none.
    fn channels_of(&self, thing_id: &str) -> Result<&BTreeSet<String>, StoreError> {
        match self.connections.get(thing_id) {
            Some(channels) if !channels.is_empty() => Ok(channels),
            _ => Err(StoreError::Authorization),
        }
    }
}

/// Stores channels behind a single mutex and owns the connect/disconnect protocol.
pub struct InMemoryChannelRepository {
    state: Mutex<ChannelsState>,
    things: Arc<dyn ThingRepository>,
    bridge: ConnectionBridge,
}

impl InMemoryChannelRepository {
    /// Creates a repository that resolves things through `things` and reports
    /// connection changes over `bridge`.
    pub fn new(things: Arc<dyn ThingRepository>, bridge: ConnectionBridge) -> Self {
        Self {
            state: Mutex::new(ChannelsState::default()),
            things,
            bridge,
        }
    }

    /// The number of channels currently stored.
    pub async fn len(&self) -> usize {
        self.state.lock().await.table.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.table.is_empty()
    }

    /// The number of channel/thing pairs on this side of the index.
    pub async fn connection_count(&self) -> usize {
        let state = self.state.lock().await;
        state.connections.values().map(BTreeSet::len).sum()
    }
}

#[async_trait]
impl ChannelRepository for InMemoryChannelRepository {
    async fn save(&self, channels: Vec<Channel>) -> Result<Vec<Channel>, StoreError> {
        let mut state = self.state.lock().await;
        let saved = state.table.insert_batch(channels).inspect_err(|_| {
            metrics::REJECTED_BATCHES_TOTAL.inc();
        })?;
        debug!("Saved {} channels.", saved.len());
        Ok(saved)
    }

    async fn update(&self, channel: Channel) -> Result<(), StoreError> {
        self.state.lock().await.table.replace(channel)
    }

    async fn retrieve_by_id(&self, id: &str) -> Result<Channel, StoreError> {
        self.state.lock().await.table.retrieve(id)
    }

    async fn retrieve_by_group_ids(
        &self,
        group_ids: &[String],
        query: &PageMetadata,
    ) -> Result<ChannelsPage, StoreError> {
        let state = self.state.lock().await;
        Ok(state.table.page_by_groups(group_ids, query))
    }

    async fn retrieve_by_admin(&self, query: &PageMetadata) -> Result<ChannelsPage, StoreError> {
        let state = self.state.lock().await;
        Ok(state.table.page_by_position(query))
    }

    async fn retrieve_by_thing(&self, thing_id: &str) -> Result<Channel, StoreError> {
        let state = self.state.lock().await;
        state
            .connections
            .get(thing_id)
            .into_iter()
            .flatten()
            .find_map(|channel_id| state.table.get(channel_id).cloned())
            .ok_or(StoreError::NotFound)
    }

    async fn remove(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        for id in ids {
            if !state.table.contains(id) {
                metrics::REJECTED_BATCHES_TOTAL.inc();
                return Err(StoreError::NotFound);
            }
            self.bridge
                .emit(ConnectionEvent::channel_removed(id.as_str()))
                .await?;

            state.table.remove(id)?;
            state.connections.retain(|_, channels| {
                channels.remove(id);
                !channels.is_empty()
            });
            debug!("Removed channel '{}' and its connections.", id);
        }
        Ok(())
    }

    async fn connect(&self, channel_id: &str, thing_ids: &[String]) -> Result<(), StoreError> {
        self.retrieve_by_id(channel_id).await?;

        for thing_id in thing_ids {
            let thing = self.things.retrieve_by_id(thing_id).await?;

            let mut state = self.state.lock().await;
            // The channel may have been removed while the thing was resolved.
            if !state.table.contains(channel_id) {
                return Err(StoreError::NotFound);
            }
            if state.channels_of(thing_id).is_ok() {
                return Err(StoreError::Conflict);
            }

            self.bridge
                .emit(ConnectionEvent::connected(channel_id, thing))
                .await?;
            state
                .connections
                .entry(thing_id.clone())
                .or_default()
                .insert(channel_id.to_string());
            debug!("Connected thing '{}' to channel '{}'.", thing_id, channel_id);
        }
        Ok(())
    }

    async fn disconnect(&self, channel_id: &str, thing_ids: &[String]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        for thing_id in thing_ids {
            let connected = state
                .connections
                .get(thing_id)
                .is_some_and(|channels| channels.contains(channel_id));
            if !connected {
                return Err(StoreError::NotFound);
            }

            self.bridge
                .emit(ConnectionEvent::disconnected(channel_id, thing_id.as_str()))
                .await?;
            if let Some(channels) = state.connections.get_mut(thing_id) {
                channels.remove(channel_id);
                if channels.is_empty() {
                    state.connections.remove(thing_id);
                }
            }
            debug!(
                "Disconnected thing '{}' from channel '{}'.",
                thing_id, channel_id
            );
        }
        Ok(())
    }

    async fn retrieve_conn_by_thing_key(&self, key: &str) -> Result<Connection, StoreError> {
        let thing_id = self.things.retrieve_by_key(key).await?;

        let state = self.state.lock().await;
        let channel_id = state
            .channels_of(&thing_id)?
            .first()
            .cloned()
            .ok_or(StoreError::Authorization)?;

        Ok(Connection {
            channel_id,
            thing_id,
        })
    }

    async fn has_thing_by_id(&self, channel_id: &str, thing_id: &str) -> Result<(), StoreError> {
        let state = self.state.lock().await;
        if state.channels_of(thing_id)?.contains(channel_id) {
            Ok(())
        } else {
            Err(StoreError::Authorization)
        }
    }

    async fn retrieve_all(&self) -> Result<Vec<Channel>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.table.values().cloned().collect())
    }

    async fn retrieve_all_connections(&self) -> Result<Vec<Connection>, StoreError> {
        let state = self.state.lock().await;
        let mut connections: Vec<Connection> = state
            .connections
            .iter()
            .flat_map(|(thing_id, channels)| {
                channels.iter().map(move |channel_id| Connection {
                    channel_id: channel_id.clone(),
                    thing_id: thing_id.clone(),
                })
            })
            .collect();
        connections.sort();
        Ok(connections)
    }
}
