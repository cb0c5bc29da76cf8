// src/core/repository.rs

//! The repository and cache contracts consumed by the service layer.
//!
//! The in-memory implementations live in `core::storage` and `core::cache`;
//! a persistent backend would implement the same traits.

use crate::core::errors::StoreError;
use crate::core::model::{Channel, Connection, Thing};
use crate::core::page::{ChannelsPage, PageMetadata, ThingsPage};
use async_trait::async_trait;

/// Persistence API for things.
#[async_trait]
pub trait ThingRepository: Send + Sync {
    /// Saves a batch of things. Either every thing is stored or none is: a key
    /// that collides with a stored thing or with another thing in the batch
    /// rejects the whole batch with `Conflict`. Things without an identifier
    /// receive a generated one.
    async fn save(&self, things: Vec<Thing>) -> Result<Vec<Thing>, StoreError>;

    /// Replaces an existing thing. The access key is not re-checked; key
    /// changes go through `update_key`.
    async fn update(&self, thing: Thing) -> Result<(), StoreError>;

    /// Changes the access key of an existing thing.
    async fn update_key(&self, id: &str, key: &str) -> Result<(), StoreError>;

    async fn retrieve_by_id(&self, id: &str) -> Result<Thing, StoreError>;

    /// Returns the identifier of the thing owning `key`.
    async fn retrieve_by_key(&self, key: &str) -> Result<String, StoreError>;

    /// Retrieves the things of the given groups, windowed by identifier ordinal.
    async fn retrieve_by_group_ids(
        &self,
        group_ids: &[String],
        query: &PageMetadata,
    ) -> Result<ThingsPage, StoreError>;

    /// Retrieves the things connected to a channel, windowed by identifier ordinal.
    async fn retrieve_by_channel(
        &self,
        channel_id: &str,
        query: &PageMetadata,
    ) -> Result<ThingsPage, StoreError>;

    /// Removes things one by one, stopping at the first unknown identifier.
    /// Things removed before the failure stay removed.
    async fn remove(&self, ids: &[String]) -> Result<(), StoreError>;

    /// Unordered snapshot of every thing, for administrative export.
    async fn retrieve_all(&self) -> Result<Vec<Thing>, StoreError>;

    /// Windows the whole table by enumeration position.
    async fn retrieve_by_admin(&self, query: &PageMetadata) -> Result<ThingsPage, StoreError>;
}

/// Persistence API for channels and the channel side of connections.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn save(&self, channels: Vec<Channel>) -> Result<Vec<Channel>, StoreError>;

    async fn update(&self, channel: Channel) -> Result<(), StoreError>;

    async fn retrieve_by_id(&self, id: &str) -> Result<Channel, StoreError>;

    async fn retrieve_by_group_ids(
        &self,
        group_ids: &[String],
        query: &PageMetadata,
    ) -> Result<ChannelsPage, StoreError>;

    async fn retrieve_by_admin(&self, query: &PageMetadata) -> Result<ChannelsPage, StoreError>;

    /// Returns the channel a thing is connected to.
    async fn retrieve_by_thing(&self, thing_id: &str) -> Result<Channel, StoreError>;

    /// Removes channels, cascading the removal into the connection indices.
    async fn remove(&self, ids: &[String]) -> Result<(), StoreError>;

    /// Connects things to a channel. A thing may hold one channel at a time.
    async fn connect(&self, channel_id: &str, thing_ids: &[String]) -> Result<(), StoreError>;

    async fn disconnect(&self, channel_id: &str, thing_ids: &[String]) -> Result<(), StoreError>;

    /// Resolves the connection of the thing owning `key`. A thing without any
    /// connection is reported as `Authorization`.
    async fn retrieve_conn_by_thing_key(&self, key: &str) -> Result<Connection, StoreError>;

    /// Succeeds only if the thing is connected to the channel.
    async fn has_thing_by_id(&self, channel_id: &str, thing_id: &str) -> Result<(), StoreError>;

    async fn retrieve_all(&self) -> Result<Vec<Channel>, StoreError>;

    async fn retrieve_all_connections(&self) -> Result<Vec<Connection>, StoreError>;
}

/// A best-effort accelerator recording "channel contains thing" facts.
///
/// Its answers must never be the sole basis of an authorization decision;
/// the channel repository's connection index is authoritative.
#[async_trait]
pub trait ChannelCache: Send + Sync {
    async fn connect(&self, channel_id: &str, thing_id: &str) -> Result<(), StoreError>;

    async fn has_thing(&self, channel_id: &str, thing_id: &str) -> bool;

    async fn disconnect(&self, channel_id: &str, thing_id: &str) -> Result<(), StoreError>;

    async fn remove(&self, channel_id: &str) -> Result<(), StoreError>;
}

/// Caches thing key lookups and group member roles.
#[async_trait]
pub trait ThingCache: Send + Sync {
    /// Stores the `key -> id` pair.
    async fn save(&self, key: &str, id: &str) -> Result<(), StoreError>;

    /// Returns the thing identifier cached for `key`.
    async fn id(&self, key: &str) -> Result<String, StoreError>;

    /// Drops every cached key that resolves to `id`.
    async fn remove(&self, id: &str) -> Result<(), StoreError>;

    async fn save_role(&self, group_id: &str, member_id: &str, role: &str)
    -> Result<(), StoreError>;

    async fn role(&self, group_id: &str, member_id: &str) -> Result<String, StoreError>;

    async fn remove_role(&self, group_id: &str, member_id: &str) -> Result<(), StoreError>;
}
