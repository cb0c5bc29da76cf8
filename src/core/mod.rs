// src/core/mod.rs

//! The central module containing the store's data model, repositories and
//! supporting tasks.

pub mod bridge;
pub mod cache;
pub mod errors;
pub mod http;
pub mod metrics;
pub mod model;
pub mod page;
pub mod repository;
pub mod state;
pub mod storage;
pub mod tasks;

pub use errors::StoreError;
pub use model::{Channel, Connection, Metadata, Thing};
pub use page::{ChannelsPage, Page, PageMetadata, SortDirection, ThingsPage};
pub use repository::{ChannelCache, ChannelRepository, ThingCache, ThingRepository};
pub use state::Store;
