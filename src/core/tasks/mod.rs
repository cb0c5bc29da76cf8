// src/core/tasks/mod.rs

//! Long-running background tasks that support the store.

pub mod connection_sync;
