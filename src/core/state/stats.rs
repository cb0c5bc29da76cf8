// src/core/state/stats.rs

//! Contains the snapshot type reported by `Store::stats`.

use serde::Serialize;

/// Entity and connection counts at one instant. The fields are read under
/// separate locks, so they are not mutually consistent under concurrent writes.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub things: usize,
    pub channels: usize,
    /// Pairs on the channel-side index.
    pub connections: usize,
    pub bridge_backlog: usize,
}
