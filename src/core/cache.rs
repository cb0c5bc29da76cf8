// src/core/cache.rs

//! In-memory implementations of the channel and thing caches.
//!
//! Both caches are independent of the repositories: they have their own lock
//! and no ordering relationship to either table.

use crate::core::errors::StoreError;
use crate::core::repository::{ChannelCache, ThingCache};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Records one "channel contains thing" fact per channel.
///
/// `connect` overwrites any previous thing for the channel, so this models a
/// single presence fact rather than a set.
#[derive(Debug, Default)]
pub struct InMemoryChannelCache {
    channels: Mutex<HashMap<String, String>>,
}

impl InMemoryChannelCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelCache for InMemoryChannelCache {
    async fn connect(&self, channel_id: &str, thing_id: &str) -> Result<(), StoreError> {
        self.channels
            .lock()
            .insert(channel_id.to_string(), thing_id.to_string());
        Ok(())
    }

    async fn has_thing(&self, channel_id: &str, thing_id: &str) -> bool {
        self.channels
            .lock()
            .get(channel_id)
            .is_some_and(|cached| cached == thing_id)
    }

    async fn disconnect(&self, channel_id: &str, _thing_id: &str) -> Result<(), StoreError> {
        self.channels.lock().remove(channel_id);
        Ok(())
    }

    async fn remove(&self, channel_id: &str) -> Result<(), StoreError> {
        self.channels.lock().remove(channel_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ThingCacheState {
    /// Access key -> thing id.
    ids: HashMap<String, String>,
    /// `group_id:member_id` -> role.
    roles: HashMap<String, String>,
}

/// Caches thing key lookups and group member roles.
#[derive(Debug, Default)]
pub struct InMemoryThingCache {
    state: Mutex<ThingCacheState>,
}

impl InMemoryThingCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn role_key(group_id: &str, member_id: &str) -> String {
    format!("{group_id}:{member_id}")
}

#[async_trait]
impl ThingCache for InMemoryThingCache {
    async fn save(&self, key: &str, id: &str) -> Result<(), StoreError> {
        self.state
            .lock()
            .ids
            .insert(key.to_string(), id.to_string());
        Ok(())
    }

    async fn id(&self, key: &str) -> Result<String, StoreError> {
        self.state
            .lock()
            .ids
            .get(key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.state.lock().ids.retain(|_, cached| cached != id);
        Ok(())
    }

    async fn save_role(
        &self,
        group_id: &str,
        member_id: &str,
        role: &str,
    ) -> Result<(), StoreError> {
        self.state
            .lock()
            .roles
            .insert(role_key(group_id, member_id), role.to_string());
        Ok(())
    }

    async fn role(&self, group_id: &str, member_id: &str) -> Result<String, StoreError> {
        self.state
            .lock()
            .roles
            .get(&role_key(group_id, member_id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn remove_role(&self, group_id: &str, member_id: &str) -> Result<(), StoreError> {
        self.state
            .lock()
            .roles
            .remove(&role_key(group_id, member_id));
        Ok(())
    }
}
