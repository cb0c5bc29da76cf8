// tests/integration/bridge_test.rs

//! Integration tests for the thing-side connection index fed by the bridge
//! Tests: RETRIEVE_BY_CHANNEL, event ordering, backpressure, concurrent connects

use super::test_helpers::{TestContext, ids};
use std::collections::BTreeSet;
use std::sync::Arc;
use thingstore::core::model::Thing;
use thingstore::core::page::PageMetadata;
use thingstore::core::repository::{ChannelRepository, ThingRepository};
use thingstore::core::Store;

fn wide_page() -> PageMetadata {
    PageMetadata::new(0, 100)
}

fn page_ids(things: &[Thing]) -> Vec<String> {
    things.iter().map(|t| t.id.clone()).collect()
}

#[tokio::test]
async fn test_connect_reaches_thing_side() {
    let ctx = TestContext::new().await;
    let channel = ctx.channel("a", "g1").await;
    let t1 = ctx.thing("k1", "one", "g1").await;
    let t2 = ctx.thing("k2", "two", "g1").await;

    ctx.store
        .channels
        .connect(&channel, &ids(&[&t1, &t2]))
        .await
        .unwrap();
    ctx.sync().await;

    let page = ctx
        .store
        .things
        .retrieve_by_channel(&channel, &wide_page())
        .await
        .unwrap();
    assert_eq!(page_ids(&page.items), vec![t1.clone(), t2.clone()]);
    assert_eq!(ctx.store.things.connected_channels(&t1).await, vec![channel]);
}

#[tokio::test]
async fn test_disconnect_reaches_thing_side() {
    let ctx = TestContext::new().await;
    let channel = ctx.channel("a", "g1").await;
    let t1 = ctx.thing("k1", "one", "g1").await;
    let t2 = ctx.thing("k2", "two", "g1").await;

    ctx.store
        .channels
        .connect(&channel, &ids(&[&t1, &t2]))
        .await
        .unwrap();
    ctx.disconnect(&channel, &t1).await.unwrap();
    ctx.sync().await;

    let page = ctx
        .store
        .things
        .retrieve_by_channel(&channel, &wide_page())
        .await
        .unwrap();
    assert_eq!(page_ids(&page.items), vec![t2]);
    assert!(ctx.store.things.connected_channels(&t1).await.is_empty());
}

#[tokio::test]
async fn test_channel_removal_reaches_thing_side() {
    let ctx = TestContext::new().await;
    let channel = ctx.channel("a", "g1").await;
    let thing = ctx.thing("k1", "one", "g1").await;

    ctx.connect(&channel, &thing).await.unwrap();
    ctx.store.channels.remove(&ids(&[&channel])).await.unwrap();
    ctx.sync().await;

    let page = ctx
        .store
        .things
        .retrieve_by_channel(&channel, &wide_page())
        .await
        .unwrap();
    assert!(page.is_empty());
    assert!(ctx.store.things.connected_channels(&thing).await.is_empty());
}

#[tokio::test]
async fn test_connect_disconnect_connect_applies_in_order() {
    let ctx = TestContext::new().await;
    let first = ctx.channel("a", "g1").await;
    let second = ctx.channel("b", "g1").await;
    let thing = ctx.thing("k1", "one", "g1").await;

    ctx.connect(&first, &thing).await.unwrap();
    ctx.disconnect(&first, &thing).await.unwrap();
    ctx.connect(&second, &thing).await.unwrap();
    ctx.sync().await;

    assert_eq!(ctx.store.things.connected_channels(&thing).await, vec![second]);
}

#[tokio::test]
async fn test_retrieve_by_channel_serves_live_records() {
    let ctx = TestContext::new().await;
    let channel = ctx.channel("a", "g1").await;
    let t1 = ctx.thing("k1", "one", "g1").await;
    let t2 = ctx.thing("k2", "two", "g1").await;

    ctx.store
        .channels
        .connect(&channel, &ids(&[&t1, &t2]))
        .await
        .unwrap();
    ctx.sync().await;

    ctx.store
        .things
        .update(Thing {
            id: t1.clone(),
            group_id: "g1".into(),
            name: "renamed".into(),
            key: "k1".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    ctx.store.things.remove(&ids(&[&t2])).await.unwrap();

    let page = ctx
        .store
        .things
        .retrieve_by_channel(&channel, &wide_page())
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].name, "renamed");
}

#[tokio::test]
async fn test_retrieve_by_channel_zero_limit_and_unknown_channel() {
    let ctx = TestContext::new().await;
    let channel = ctx.channel("a", "g1").await;
    let thing = ctx.thing("k1", "one", "g1").await;
    ctx.connect(&channel, &thing).await.unwrap();
    ctx.sync().await;

    let page = ctx
        .store
        .things
        .retrieve_by_channel(&channel, &PageMetadata::new(0, 0))
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.metadata.total, 1);

    let page = ctx
        .store
        .things
        .retrieve_by_channel("999", &wide_page())
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_tiny_bridge_applies_every_event() {
    let ctx = TestContext::with_bridge_capacity(1).await;
    let channel = ctx.channel("a", "g1").await;

    let mut things = Vec::new();
    for i in 0..20 {
        things.push(ctx.thing(&format!("k{i}"), &format!("t{i}"), "g1").await);
    }
    ctx.store.channels.connect(&channel, &things).await.unwrap();
    ctx.sync().await;

    let page = ctx
        .store
        .things
        .retrieve_by_channel(&channel, &wide_page())
        .await
        .unwrap();
    assert_eq!(page_ids(&page.items), things);
    assert_eq!(ctx.store.bridge_backlog(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connects_agree_on_both_sides() {
    let store = Arc::new(Store::with_bridge_capacity(8));

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let channel = store
                .channels
                .save(vec![Default::default()])
                .await
                .unwrap()
                .remove(0);
            let thing = store
                .things
                .save(vec![Thing::with_key(format!("key-{i}"))])
                .await
                .unwrap()
                .remove(0);
            store
                .channels
                .connect(&channel.id, &[thing.id.clone()])
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    store.sync().await.unwrap();

    let channel_side: BTreeSet<(String, String)> = store
        .channels
        .retrieve_all_connections()
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.channel_id, c.thing_id))
        .collect();
    assert_eq!(channel_side.len(), 16);

    let mut thing_side = BTreeSet::new();
    for thing in store.things.retrieve_all().await.unwrap() {
        for channel_id in store.things.connected_channels(&thing.id).await {
            thing_side.insert((channel_id, thing.id.clone()));
        }
    }
    assert_eq!(channel_side, thing_side);
}
