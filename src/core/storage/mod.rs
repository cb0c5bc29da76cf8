// src/core/storage/mod.rs

//! In-memory repositories for things and channels.

pub mod channels;
pub mod table;
pub mod things;

pub use channels::InMemoryChannelRepository;
pub use table::EntityTable;
pub use things::InMemoryThingRepository;
