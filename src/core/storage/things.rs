// src/core/storage/things.rs

//! The in-memory thing repository and the thing side of the connection index.

use super::table::EntityTable;
use crate::core::bridge::ConnectionEvent;
use crate::core::errors::StoreError;
use crate::core::metrics;
use crate::core::model::Thing;
use crate::core::page::{self, Page, PageMetadata, ThingsPage};
use crate::core::repository::ThingRepository;
use async_trait::async_trait;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Everything guarded by the thing repository's lock.
#[derive(Debug, Default)]
struct ThingsState {
    table: EntityTable<Thing>,
    /// Channel id -> ids of the things connected to it, in connect order.
    /// Only ever written by `apply_connection_event`.
    connections: HashMap<String, IndexSet<String>>,
}

/// Stores things behind a single mutex. The connection index on this side is
/// fed exclusively by events arriving over the connection bridge.
#[derive(Debug, Default)]
pub struct InMemoryThingRepository {
    state: Mutex<ThingsState>,
}

impl InMemoryThingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of things currently stored.
    pub async fn len(&self) -> usize {
        self.state.lock().await.table.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.table.is_empty()
    }

    /// Channel ids this side currently believes `thing_id` is connected to.
    /// Reflects the bridge, so it may briefly lag the channel side.
    pub async fn connected_channels(&self, thing_id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        let mut channels: Vec<String> = state
            .connections
            .iter()
            .filter(|(_, things)| things.contains(thing_id))
            .map(|(channel_id, _)| channel_id.clone())
            .collect();
        channels.sort();
        channels
    }

    /// Applies one bridge event to the thing-side index.
    pub(crate) async fn apply_connection_event(&self, event: ConnectionEvent) {
        let kind = event.kind();
        let ConnectionEvent {
            channel_id,
            thing,
            connected,
        } = event;
        let mut state = self.state.lock().await;

        match (connected, thing) {
            (true, Some(thing)) => {
                debug!("Thing '{}' connected to channel '{}'.", thing.id, channel_id);
                state
                    .connections
                    .entry(channel_id)
                    .or_default()
                    .insert(thing.id);
            }
            (true, None) => {
                warn!(
                    "Ignoring connect event for channel '{}' that carries no thing.",
                    channel_id
                );
                return;
            }
            (false, Some(thing)) => {
                if let Some(things) = state.connections.get_mut(&channel_id) {
                    things.shift_remove(&thing.id);
                    if things.is_empty() {
                        state.connections.remove(&channel_id);
                    }
                }
                debug!(
                    "Thing '{}' disconnected from channel '{}'.",
                    thing.id, channel_id
                );
            }
            (false, None) => {
                state.connections.remove(&channel_id);
                debug!("Dropped every connection of channel '{}'.", channel_id);
            }
        }
        metrics::BRIDGE_EVENTS_APPLIED_TOTAL
            .with_label_values(&[kind])
            .inc();
    }
}

#[async_trait]
impl ThingRepository for InMemoryThingRepository {
    async fn save(&self, things: Vec<Thing>) -> Result<Vec<Thing>, StoreError> {
        let mut state = self.state.lock().await;

        let mut batch_keys = HashSet::with_capacity(things.len());
        for thing in &things {
            let taken = state.table.values().any(|t| t.key == thing.key);
            if taken || !batch_keys.insert(thing.key.as_str()) {
                metrics::REJECTED_BATCHES_TOTAL.inc();
                return Err(StoreError::Conflict);
            }
        }

        let saved = state.table.insert_batch(things).inspect_err(|_| {
            metrics::REJECTED_BATCHES_TOTAL.inc();
        })?;
        debug!("Saved {} things.", saved.len());
        Ok(saved)
    }

    async fn update(&self, thing: Thing) -> Result<(), StoreError> {
        self.state.lock().await.table.replace(thing)
    }

    async fn update_key(&self, id: &str, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        if state.table.values().any(|t| t.key == key) {
            return Err(StoreError::Conflict);
        }
        let thing = state.table.get_mut(id).ok_or(StoreError::NotFound)?;
        thing.key = key.to_string();
        Ok(())
    }

    async fn retrieve_by_id(&self, id: &str) -> Result<Thing, StoreError> {
        self.state.lock().await.table.retrieve(id)
    }

    async fn retrieve_by_key(&self, key: &str) -> Result<String, StoreError> {
        let state = self.state.lock().await;
        state
            .table
            .values()
            .find(|t| t.key == key)
            .map(|t| t.id.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn retrieve_by_group_ids(
        &self,
        group_ids: &[String],
        query: &PageMetadata,
    ) -> Result<ThingsPage, StoreError> {
        let state = self.state.lock().await;
        Ok(state.table.page_by_groups(group_ids, query))
    }

    async fn retrieve_by_channel(
        &self,
        channel_id: &str,
        query: &PageMetadata,
    ) -> Result<ThingsPage, StoreError> {
        let state = self.state.lock().await;
        let total = state.table.counter();

        let Some(connected) = state.connections.get(channel_id) else {
            return Ok(Page::empty(query, total));
        };

        // Serve the live records; things removed since connecting are skipped.
        let live: Vec<&Thing> = connected
            .iter()
            .filter_map(|id| state.table.get(id))
            .collect();
        let items = page::window_by_ordinal(live, query);
        Ok(page::finish_page(items, query, total))
    }

    async fn remove(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        for id in ids {
            if let Err(e) = state.table.remove(id) {
                metrics::REJECTED_BATCHES_TOTAL.inc();
                return Err(e);
            }
            state.connections.retain(|_, things| {
                things.shift_remove(id);
                !things.is_empty()
            });
            debug!("Removed thing '{}'.", id);
        }
        Ok(())
    }

    async fn retrieve_all(&self) -> Result<Vec<Thing>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.table.values().cloned().collect())
    }

    async fn retrieve_by_admin(&self, query: &PageMetadata) -> Result<ThingsPage, StoreError> {
        let state = self.state.lock().await;
        Ok(state.table.page_by_position(query))
    }
}
