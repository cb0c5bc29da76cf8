// tests/integration/lifecycle_test.rs

//! Integration tests for store startup, stats and shutdown

use super::test_helpers::TestContext;
use std::time::Duration;
use thingstore::config::Config;
use thingstore::core::repository::ChannelRepository;
use thingstore::core::{Store, StoreError};

#[tokio::test]
async fn test_new_store_is_running_and_empty() {
    let ctx = TestContext::new().await;

    assert!(!ctx.store.is_stopped());
    let stats = ctx.store.stats().await;
    assert_eq!(stats.things, 0);
    assert_eq!(stats.channels, 0);
    assert_eq!(stats.connections, 0);
    assert_eq!(stats.bridge_backlog, 0);
}

#[tokio::test]
async fn test_stats_count_entities_and_connections() {
    let ctx = TestContext::new().await;
    let channel = ctx.channel("a", "g1").await;
    let t1 = ctx.thing("k1", "one", "g1").await;
    ctx.thing("k2", "two", "g1").await;
    ctx.connect(&channel, &t1).await.unwrap();
    ctx.sync().await;

    let stats = ctx.store.stats().await;
    assert_eq!(stats.things, 2);
    assert_eq!(stats.channels, 1);
    assert_eq!(stats.connections, 1);
    assert_eq!(stats.bridge_backlog, 0);
}

#[tokio::test]
async fn test_shutdown_drains_pending_events() {
    let ctx = TestContext::new().await;
    let channel = ctx.channel("a", "g1").await;
    let mut things = Vec::new();
    for i in 0..10 {
        things.push(ctx.thing(&format!("k{i}"), "t", "g1").await);
    }
    ctx.store.channels.connect(&channel, &things).await.unwrap();

    ctx.store.shutdown(Duration::from_secs(5)).await;

    assert!(ctx.store.is_stopped());
    for thing in &things {
        assert_eq!(
            ctx.store.things.connected_channels(thing).await,
            vec![channel.clone()]
        );
    }
}

#[tokio::test]
async fn test_operations_after_shutdown() {
    let ctx = TestContext::new().await;
    let channel = ctx.channel("a", "g1").await;
    let thing = ctx.thing("k1", "one", "g1").await;

    ctx.store.shutdown(Duration::from_secs(5)).await;
    // A second shutdown is a no-op.
    ctx.store.shutdown(Duration::from_secs(5)).await;

    assert_eq!(ctx.store.sync().await, Err(StoreError::BridgeClosed));
    assert_eq!(
        ctx.connect(&channel, &thing).await,
        Err(StoreError::BridgeClosed)
    );
    // Reads that do not touch the bridge keep working.
    assert_eq!(ctx.store.channels.retrieve_by_id(&channel).await.unwrap().id, channel);
}

#[tokio::test]
async fn test_store_from_config() {
    let config = Config::from_toml("bridge_capacity = 2").unwrap();
    let store = Store::from_config(&config);

    assert!(!store.is_stopped());
    store.sync().await.unwrap();
    store.shutdown(Duration::from_secs(1)).await;
    assert!(store.is_stopped());
}

#[test]
#[should_panic]
fn test_store_requires_runtime() {
    let _store = Store::new();
}

#[test]
fn test_store_inside_explicit_runtime() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let store = Store::new();
        store.sync().await.unwrap();
        store.shutdown(Duration::from_secs(1)).await;
        assert!(store.is_stopped());
    });
}
