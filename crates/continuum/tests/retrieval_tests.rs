//! Integration tests for store and retrieve
//!
//! Exercises ranking, filtering and access bookkeeping through the public
//! MemoryStore API against a snapshot in a temporary directory.

use chrono::Duration;
use continuum::memory::types::MetadataOverrides;
use continuum::storage::{MemoryFilter, MemoryStore};
use continuum::testing::test_config;
use serde_json::json;
use tempfile::tempdir;

async fn create_test_store() -> (MemoryStore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = MemoryStore::open(&test_config(dir.path())).await.unwrap();
    (store, dir)
}

mod ranking_tests {
    use super::*;

    #[tokio::test]
    async fn test_store_then_retrieve_single_record() {
        let (mut store, _dir) = create_test_store().await;

        let id = store
            .store(json!("the deployment failed on friday"), 0.4, MetadataOverrides::new())
            .await
            .unwrap();

        let results = store
            .retrieve(&json!("the deployment failed on friday"), 1, &MemoryFilter::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id);
    }

    #[tokio::test]
    async fn test_surprise_and_similarity_ranking() {
        let (mut store, _dir) = create_test_store().await;

        let first = store
            .store(json!("apple banana cherry"), 0.9, MetadataOverrides::new())
            .await
            .unwrap();
        store
            .store(json!("dog elephant fox"), 0.1, MetadataOverrides::new())
            .await
            .unwrap();
        store
            .store(json!("guitar piano violin"), 0.5, MetadataOverrides::new())
            .await
            .unwrap();

        let results = store
            .retrieve(
                &json!("apple banana cherry"),
                2,
                &MemoryFilter::new().with_min_surprise(0.0),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, first);
        assert_eq!(results[0].surprise_score, 0.9);
    }

    #[tokio::test]
    async fn test_surprise_breaks_equal_similarity() {
        let (mut store, _dir) = create_test_store().await;

        store
            .store(json!("shared words here"), 0.2, MetadataOverrides::new())
            .await
            .unwrap();
        let high = store
            .store(json!("shared words here"), 0.8, MetadataOverrides::new())
            .await
            .unwrap();

        let results = store
            .retrieve(&json!("shared words here"), 2, &MemoryFilter::new())
            .await
            .unwrap();

        assert_eq!(results[0].id, high);
    }

    #[tokio::test]
    async fn test_limit_caps_results() {
        let (mut store, _dir) = create_test_store().await;
        for i in 0..10 {
            store
                .store(json!(format!("note {i}")), 0.5, MetadataOverrides::new())
                .await
                .unwrap();
        }

        let results = store
            .retrieve(&json!("note"), 3, &MemoryFilter::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_stable_order() {
        let (mut store, _dir) = create_test_store().await;
        for i in 0..5 {
            store
                .store(json!(format!("unrelated {i}")), 0.0, MetadataOverrides::new())
                .await
                .unwrap();
        }

        let first = store
            .retrieve(&json!("query"), 5, &MemoryFilter::new())
            .await
            .unwrap();
        let second = store
            .retrieve(&json!("query"), 5, &MemoryFilter::new())
            .await
            .unwrap();

        let first_ids: Vec<_> = first.iter().map(|r| r.id).collect();
        let second_ids: Vec<_> = second.iter().map(|r| r.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_structured_payload_roundtrip() {
        let (mut store, _dir) = create_test_store().await;
        let payload = json!({"task": "summarize report", "tokens": 512});

        let id = store
            .store(payload.clone(), 0.5, MetadataOverrides::new())
            .await
            .unwrap();

        let results = store
            .retrieve(&payload, 1, &MemoryFilter::new())
            .await
            .unwrap();
        assert_eq!(results[0].id, id);
        assert_eq!(results[0].payload, payload);
    }
}

mod filter_tests {
    use super::*;

    #[tokio::test]
    async fn test_default_filter_skips_negative_surprise() {
        let (mut store, _dir) = create_test_store().await;
        store
            .store(json!("negative novelty"), -0.5, MetadataOverrides::new())
            .await
            .unwrap();

        let results = store
            .retrieve(&json!("negative novelty"), 10, &MemoryFilter::new())
            .await
            .unwrap();
        assert!(results.is_empty());

        let lowered = store
            .retrieve(
                &json!("negative novelty"),
                10,
                &MemoryFilter::new().with_min_surprise(-1.0),
            )
            .await
            .unwrap();
        assert_eq!(lowered.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty() {
        let (mut store, _dir) = create_test_store().await;

        let results = store
            .retrieve(&json!("anything"), 10, &MemoryFilter::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_no_survivors_returns_empty() {
        let (mut store, _dir) = create_test_store().await;
        store
            .store(json!("low surprise"), 0.1, MetadataOverrides::new())
            .await
            .unwrap();

        let results = store
            .retrieve(
                &json!("low surprise"),
                10,
                &MemoryFilter::new().with_min_surprise(0.5),
            )
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_context_and_level_filters() {
        let (mut store, _dir) = create_test_store().await;

        let tagged = store
            .store(
                json!("build pipeline notes"),
                0.5,
                MetadataOverrides::new().with_context("ci").with_level(1),
            )
            .await
            .unwrap();
        store
            .store(json!("build pipeline notes"), 0.5, MetadataOverrides::new())
            .await
            .unwrap();

        let by_context = store
            .retrieve(
                &json!("build pipeline notes"),
                10,
                &MemoryFilter::new().with_context("ci"),
            )
            .await
            .unwrap();
        assert_eq!(by_context.len(), 1);
        assert_eq!(by_context[0].id, tagged);

        let by_level = store
            .retrieve(
                &json!("build pipeline notes"),
                10,
                &MemoryFilter::new().with_level(0),
            )
            .await
            .unwrap();
        assert_eq!(by_level.len(), 1);
        assert_ne!(by_level[0].id, tagged);
    }

    #[tokio::test]
    async fn test_max_age_keeps_fresh_records() {
        let (mut store, _dir) = create_test_store().await;
        store
            .store(json!("just now"), 0.5, MetadataOverrides::new())
            .await
            .unwrap();

        let results = store
            .retrieve(
                &json!("just now"),
                10,
                &MemoryFilter::new().with_max_age(Duration::hours(1)),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_only_returned_records_are_touched() {
        let (mut store, _dir) = create_test_store().await;
        let hit = store
            .store(json!("match me"), 0.9, MetadataOverrides::new())
            .await
            .unwrap();
        let miss = store
            .store(json!("other text"), 0.1, MetadataOverrides::new())
            .await
            .unwrap();

        store
            .retrieve(&json!("match me"), 1, &MemoryFilter::new())
            .await
            .unwrap();

        assert_eq!(store.get(hit).unwrap().metadata.access_count, 1);
        assert_eq!(store.get(miss).unwrap().metadata.access_count, 0);
    }
}
