// tests/property/connection_test.rs

//! Property-based tests for the two connection indices
//! Tests that the channel side and the thing side converge after any mix of
//! connects, disconnects and channel removals

use crate::test_helpers::{TestContext, ids};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use thingstore::core::repository::{ChannelRepository, ThingRepository};

#[derive(Debug, Clone)]
enum Op {
    Connect(usize, usize),
    Disconnect(usize, usize),
    RemoveChannel(usize),
}

const CHANNELS: usize = 4;
const THINGS: usize = 6;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..CHANNELS, 0..THINGS).prop_map(|(c, t)| Op::Connect(c, t)),
        2 => (0..CHANNELS, 0..THINGS).prop_map(|(c, t)| Op::Disconnect(c, t)),
        1 => (0..CHANNELS).prop_map(Op::RemoveChannel),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 40,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_indices_converge(
        ops in prop::collection::vec(op_strategy(), 1..=40),
        capacity in 1usize..=8
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::with_bridge_capacity(capacity).await;
            let mut channels = Vec::new();
            for c in 0..CHANNELS {
                channels.push(ctx.channel(&format!("c{c}"), "g1").await);
            }
            let mut things = Vec::new();
            for t in 0..THINGS {
                things.push(ctx.thing(&format!("k{t}"), &format!("t{t}"), "g1").await);
            }

            // Thing index -> channel index, mirroring the at-most-one rule.
            let mut model: BTreeMap<usize, usize> = BTreeMap::new();
            let mut removed = BTreeSet::new();

            for op in &ops {
                match *op {
                    Op::Connect(c, t) => {
                        let result = ctx.connect(&channels[c], &things[t]).await;
                        if removed.contains(&c) || model.contains_key(&t) {
                            assert!(result.is_err());
                        } else {
                            assert!(result.is_ok());
                            model.insert(t, c);
                        }
                    }
                    Op::Disconnect(c, t) => {
                        let result = ctx.disconnect(&channels[c], &things[t]).await;
                        if model.get(&t) == Some(&c) {
                            assert!(result.is_ok());
                            model.remove(&t);
                        } else {
                            assert!(result.is_err());
                        }
                    }
                    Op::RemoveChannel(c) => {
                        let result = ctx.store.channels.remove(&ids(&[&channels[c]])).await;
                        if removed.insert(c) {
                            assert!(result.is_ok());
                            model.retain(|_, ch| *ch != c);
                        } else {
                            assert!(result.is_err());
                        }
                    }
                }
            }
            ctx.sync().await;

            let expected: BTreeSet<(String, String)> = model
                .iter()
                .map(|(t, c)| (channels[*c].clone(), things[*t].clone()))
                .collect();

            let channel_side: BTreeSet<(String, String)> = ctx
                .store
                .channels
                .retrieve_all_connections()
                .await
                .unwrap()
                .into_iter()
                .map(|c| (c.channel_id, c.thing_id))
                .collect();
            assert_eq!(&channel_side, &expected);

            let mut thing_side = BTreeSet::new();
            for thing in ctx.store.things.retrieve_all().await.unwrap() {
                for channel_id in ctx.store.things.connected_channels(&thing.id).await {
                    thing_side.insert((channel_id, thing.id.clone()));
                }
            }
            assert_eq!(&thing_side, &expected);
        });
    }
}
