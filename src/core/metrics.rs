// src/core/metrics.rs

//! Defines and registers Prometheus metrics for store monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Gauge, IntCounter, TextEncoder, register_counter_vec, register_gauge,
    register_int_counter,
};

lazy_static! {
    // --- Store Gauges ---
    /// The number of things currently stored.
    pub static ref THINGS_STORED: Gauge =
        register_gauge!("thingstore_things", "Number of things currently stored.").unwrap();
    /// The number of channels currently stored.
    pub static ref CHANNELS_STORED: Gauge =
        register_gauge!("thingstore_channels", "Number of channels currently stored.").unwrap();
    /// The number of channel/thing pairs on the channel-side index.
    pub static ref CONNECTIONS_STORED: Gauge =
        register_gauge!("thingstore_connections", "Number of channel/thing connections.").unwrap();
    /// Events queued on the bridge but not yet consumed.
    pub static ref BRIDGE_BACKLOG: Gauge =
        register_gauge!("thingstore_bridge_backlog", "Connection events waiting on the bridge.").unwrap();


    // --- Counters ---
    /// Events put on the bridge by the channel side, labeled by kind.
    pub static ref BRIDGE_EVENTS_EMITTED_TOTAL: CounterVec =
        register_counter_vec!("thingstore_bridge_events_emitted_total", "Connection events emitted, labeled by kind.", &["kind"]).unwrap();
    /// Events applied by the thing side, labeled by kind.
    pub static ref BRIDGE_EVENTS_APPLIED_TOTAL: CounterVec =
        register_counter_vec!("thingstore_bridge_events_applied_total", "Connection events applied, labeled by kind.", &["kind"]).unwrap();
    /// Save/remove batches rejected part way or up front.
    pub static ref REJECTED_BATCHES_TOTAL: IntCounter =
        register_int_counter!("thingstore_rejected_batches_total", "Total number of save or remove batches that failed.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}
