// src/core/state/mod.rs

//! Defines the `Store` that owns the repositories, caches and background task.

mod core;
mod stats;

pub use self::core::Store;
pub use stats::StoreStats;
