// tests/property/repository_test.rs

//! Property-based tests for entity storage and paging
//! Tests that key uniqueness, identifier assignment and ordering always hold

use crate::test_helpers::{TestContext, ids};
use proptest::prelude::*;
use std::collections::HashSet;
use thingstore::core::model::Thing;
use thingstore::core::page::{PageMetadata, SortDirection};
use thingstore::core::repository::ThingRepository;
use thingstore::core::StoreError;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 50,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_keys_stay_unique(
        keys in prop::collection::vec("[a-d]{1,2}", 1..=30)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let mut accepted = HashSet::new();

            for key in &keys {
                let result = ctx.store.things.save(vec![Thing::with_key(key.clone())]).await;
                if accepted.insert(key.clone()) {
                    assert!(result.is_ok(), "first save of '{}' must succeed", key);
                } else {
                    assert_eq!(result, Err(StoreError::Conflict));
                }
            }

            let stored = ctx.store.things.retrieve_all().await.unwrap();
            assert_eq!(stored.len(), accepted.len());
            let stored_keys: HashSet<String> = stored.into_iter().map(|t| t.key).collect();
            assert_eq!(stored_keys, accepted);
        });
    }

    #[test]
    fn test_batch_with_duplicate_key_stores_nothing(
        keys in prop::collection::hash_set("[a-z]{1,8}", 1..=10),
        dup_index in any::<prop::sample::Index>()
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let mut batch: Vec<Thing> = keys.iter().cloned().map(Thing::with_key).collect();
            let dup = batch[dup_index.index(batch.len())].clone();
            batch.push(dup);

            let result = ctx.store.things.save(batch).await;
            assert_eq!(result, Err(StoreError::Conflict));
            assert!(ctx.store.things.is_empty().await);

            // The rejected batch did not consume identifiers.
            let saved = ctx.store.things.save(vec![Thing::with_key("fresh")]).await.unwrap();
            assert_eq!(saved[0].id, "001");
        });
    }

    #[test]
    fn test_save_then_retrieve_returns_same_record(
        specs in prop::collection::vec(("[a-z]{0,10}", "g[0-3]"), 1..=20)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let batch: Vec<Thing> = specs
                .iter()
                .enumerate()
                .map(|(i, (name, group))| Thing {
                    key: format!("key-{i}"),
                    name: name.clone(),
                    group_id: group.clone(),
                    ..Default::default()
                })
                .collect();

            let saved = ctx.store.things.save(batch).await.unwrap();
            for (i, thing) in saved.iter().enumerate() {
                assert_eq!(thing.id, format!("{:03}", i + 1));
                assert_eq!(ctx.store.things.retrieve_by_id(&thing.id).await.unwrap(), *thing);
                assert_eq!(ctx.store.things.retrieve_by_key(&thing.key).await.unwrap(), thing.id);
            }
        });
    }

    #[test]
    fn test_update_key_moves_lookup(
        keys in prop::collection::hash_set("[a-z]{1,6}", 2..=10),
        target in any::<prop::sample::Index>(),
        new_key in "[A-Z]{1,6}"
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let keys: Vec<String> = keys.into_iter().collect();
            let saved = ctx
                .store
                .things
                .save(keys.iter().cloned().map(Thing::with_key).collect())
                .await
                .unwrap();
            let thing = &saved[target.index(saved.len())];
            let other = saved.iter().find(|t| t.id != thing.id).unwrap();

            // Taking another thing's key is refused and changes nothing.
            assert_eq!(
                ctx.store.things.update_key(&thing.id, &other.key).await,
                Err(StoreError::Conflict)
            );
            assert_eq!(ctx.store.things.retrieve_by_key(&thing.key).await.unwrap(), thing.id);

            ctx.store.things.update_key(&thing.id, &new_key).await.unwrap();
            assert_eq!(ctx.store.things.retrieve_by_key(&new_key).await.unwrap(), thing.id);
            assert_eq!(
                ctx.store.things.retrieve_by_key(&thing.key).await,
                Err(StoreError::NotFound)
            );
            assert_eq!(ctx.store.things.retrieve_by_id(&thing.id).await.unwrap().key, new_key);
        });
    }

    #[test]
    fn test_zero_limit_pages_are_empty(
        count in 0usize..20,
        offset in 0u64..30
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            for i in 0..count {
                ctx.thing(&format!("k{i}"), "t", "g1").await;
            }
            let query = PageMetadata::new(offset, 0);

            let page = ctx.store.things.retrieve_by_admin(&query).await.unwrap();
            assert!(page.is_empty());
            let page = ctx
                .store
                .things
                .retrieve_by_group_ids(&ids(&["g1"]), &query)
                .await
                .unwrap();
            assert!(page.is_empty());
            assert_eq!(page.metadata.total, count as u64);
        });
    }

    #[test]
    fn test_name_sort_is_deterministic(
        names in prop::collection::vec("[ab]{1,2}", 1..=20),
        desc in any::<bool>()
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            for (i, name) in names.iter().enumerate() {
                ctx.thing(&format!("k{i}"), name, "g1").await;
            }
            let dir = if desc { SortDirection::Desc } else { SortDirection::Asc };
            let query = PageMetadata::new(0, 100).ordered_by("name", dir);

            let first = ctx.store.things.retrieve_by_group_ids(&ids(&["g1"]), &query).await.unwrap();
            let second = ctx.store.things.retrieve_by_group_ids(&ids(&["g1"]), &query).await.unwrap();
            assert_eq!(&first.items, &second.items);
            assert_eq!(first.len(), names.len());

            for pair in first.items.windows(2) {
                let ord = (&pair[0].name, &pair[0].id).cmp(&(&pair[1].name, &pair[1].id));
                if desc {
                    assert!(ord.is_gt());
                } else {
                    assert!(ord.is_lt());
                }
            }
        });
    }
}
