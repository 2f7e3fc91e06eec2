//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 故障注入测试：缓存故障降级、存储故障失败、失效失败只告警

#[path = "../common/mod.rs"]
mod common;

use async_trait::async_trait;
use common::{build_coordinator, test_options, CountingStore, FlakyCache};
use mockall::mock;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use todocache::error::{StoreError, StoreResult};
use todocache::store::DurableStore;
use todocache::{CoordinatorError, Invalidation, ListingSource, NewRecord, Record, RecordId};

mock! {
    pub Store {}

    #[async_trait]
    impl DurableStore for Store {
        async fn create(&self, record: NewRecord) -> StoreResult<Record>;
        async fn list_all(&self) -> StoreResult<Vec<Record>>;
        async fn ping(&self) -> StoreResult<()>;
        async fn close(&self) -> StoreResult<()>;
        fn name(&self) -> &'static str;
    }
}

fn record(id: i64, task: &str) -> Record {
    Record {
        id: RecordId(id),
        task: task.to_string(),
        completed: false,
    }
}

mod cache_failures {
    use super::*;

    #[tokio::test]
    async fn test_get_failure_falls_back_to_store() {
        let cache = Arc::new(FlakyCache::new());
        let store = Arc::new(CountingStore::new());
        let coordinator = build_coordinator(cache.clone(), store.clone(), test_options());
        let created = coordinator.create_record("survives").await.unwrap();

        cache.fail_get.store(true, Ordering::SeqCst);
        let listing = coordinator.list_records().await.unwrap();

        assert_eq!(listing.records, vec![created.record]);
        assert_eq!(listing.source, ListingSource::StoreDegraded);
        // 降级路径不写回缓存
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.metrics().count("list", "degraded"), 1);
    }

    #[tokio::test]
    async fn test_all_cache_operations_failing() {
        let cache = Arc::new(FlakyCache::failing_all());
        let store = Arc::new(CountingStore::new());
        let coordinator = build_coordinator(cache, store.clone(), test_options());

        let created = coordinator.create_record("no cache").await.unwrap();
        assert!(matches!(created.invalidation, Invalidation::Failed(_)));

        let listing = coordinator.list_records().await.unwrap();
        assert_eq!(listing.records, vec![created.record]);
        assert_eq!(listing.source, ListingSource::StoreDegraded);
        assert_eq!(store.lists(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cache_times_out_and_degrades() {
        let cache = Arc::new(FlakyCache::new());
        cache.set_delay(Duration::from_secs(30));
        let store = Arc::new(CountingStore::new());
        let coordinator = build_coordinator(cache, store.clone(), test_options());

        let created = coordinator.create_record("slow").await.unwrap();
        assert!(matches!(
            created.invalidation,
            Invalidation::Failed(ref r) if r.contains("timed out")
        ));

        let listing = coordinator.list_records().await.unwrap();
        assert_eq!(listing.source, ListingSource::StoreDegraded);
        assert_eq!(listing.records.len(), 1);
    }

    #[tokio::test]
    async fn test_set_failure_still_returns_snapshot() {
        let cache = Arc::new(FlakyCache::new());
        cache.fail_set.store(true, Ordering::SeqCst);
        let store = Arc::new(CountingStore::new());
        let coordinator = build_coordinator(cache.clone(), store.clone(), test_options());
        coordinator.create_record("a").await.unwrap();

        let first = coordinator.list_records().await.unwrap();
        let second = coordinator.list_records().await.unwrap();

        assert_eq!(first.source, ListingSource::Store);
        assert_eq!(second.source, ListingSource::Store);
        assert_eq!(first.records, second.records);
        assert_eq!(store.lists(), 2);
        assert_eq!(coordinator.metrics().count("list", "cache_write_failed"), 2);
    }

    #[tokio::test]
    async fn test_invalidation_failure_reports_success() {
        let cache = Arc::new(FlakyCache::new());
        let store = Arc::new(CountingStore::new());
        let coordinator = build_coordinator(cache.clone(), store.clone(), test_options());
        coordinator.list_records().await.unwrap();

        cache.fail_delete.store(true, Ordering::SeqCst);
        let created = coordinator.create_record("stale for a while").await.unwrap();

        assert_eq!(created.record.task, "stale for a while");
        assert!(matches!(created.invalidation, Invalidation::Failed(_)));
        assert_eq!(store.creates(), 1);
        assert_eq!(coordinator.metrics().count("create", "invalidation_failed"), 1);

        // 旧快照保留到TTL，期间读到的是写入前的数据
        let listing = coordinator.list_records().await.unwrap();
        assert_eq!(listing.source, ListingSource::Cache);
        assert!(listing.records.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_invalidate_surfaces_cache_error() {
        let cache = Arc::new(FlakyCache::new());
        cache.fail_delete.store(true, Ordering::SeqCst);
        let coordinator = build_coordinator(cache, Arc::new(CountingStore::new()), test_options());

        assert!(coordinator.invalidate().await.is_err());
        assert_eq!(coordinator.metrics().count("invalidate", "cache_error"), 1);
    }
}

mod store_failures {
    use super::*;

    #[tokio::test]
    async fn test_list_fails_closed_and_skips_cache_write() {
        let cache = Arc::new(FlakyCache::new());
        let store = Arc::new(CountingStore::failing());
        let coordinator = build_coordinator(cache.clone(), store, test_options());

        let err = coordinator.list_records().await.unwrap_err();
        assert!(matches!(err, CoordinatorError::StoreUnavailable(_)));
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
        assert!(!cache.contains(coordinator.collection_key().as_str()).await);
    }

    #[tokio::test]
    async fn test_degraded_list_with_failing_store() {
        let cache = Arc::new(FlakyCache::failing_all());
        let coordinator =
            build_coordinator(cache, Arc::new(CountingStore::failing()), test_options());

        assert!(matches!(
            coordinator.list_records().await,
            Err(CoordinatorError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_create_failure_skips_invalidation() {
        let cache = Arc::new(FlakyCache::new());
        let coordinator =
            build_coordinator(cache.clone(), Arc::new(CountingStore::failing()), test_options());

        let err = coordinator.create_record("lost").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::StoreUnavailable(_)));
        assert_eq!(cache.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.metrics().count("create", "store_error"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = Arc::new(CountingStore::new());
        store.list_delay_ms.store(60_000, Ordering::SeqCst);
        store.create_delay_ms.store(60_000, Ordering::SeqCst);
        let coordinator = build_coordinator(Arc::new(FlakyCache::new()), store, test_options());

        let err = coordinator.list_records().await.unwrap_err();
        assert!(err.to_string().contains("timed out"));

        let err = coordinator.create_record("late").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_store_error_message_is_descriptive() {
        let mut store = MockStore::new();
        store
            .expect_list_all()
            .times(1)
            .returning(|| Err(StoreError::BackendError("connection refused".to_string())));
        store.expect_name().return_const("mock");

        let coordinator =
            build_coordinator(Arc::new(FlakyCache::new()), Arc::new(store), test_options());
        let err = coordinator.list_records().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}

mod mocked_store {
    use super::*;

    #[tokio::test]
    async fn test_validation_error_makes_no_store_calls() {
        let mut store = MockStore::new();
        store.expect_create().never();
        store.expect_list_all().never();
        store.expect_name().return_const("mock");

        let cache = Arc::new(FlakyCache::new());
        let coordinator = build_coordinator(cache.clone(), Arc::new(store), test_options());

        assert!(matches!(
            coordinator.create_record("").await,
            Err(CoordinatorError::Validation(_))
        ));
        assert_eq!(cache.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_passes_task_through_unchanged() {
        let mut store = MockStore::new();
        store
            .expect_create()
            .withf(|r: &NewRecord| r.task == "buy milk" && !r.completed)
            .times(1)
            .returning(|r| Ok(record(42, &r.task)));
        store.expect_name().return_const("mock");

        let coordinator =
            build_coordinator(Arc::new(FlakyCache::new()), Arc::new(store), test_options());
        let created = coordinator.create_record("buy milk").await.unwrap();
        assert_eq!(created.record, record(42, "buy milk"));
    }

    #[tokio::test]
    async fn test_hit_path_never_reaches_store() {
        let mut store = MockStore::new();
        store
            .expect_list_all()
            .times(1)
            .returning(|| Ok(vec![record(1, "cached")]));
        store.expect_name().return_const("mock");

        let coordinator =
            build_coordinator(Arc::new(FlakyCache::new()), Arc::new(store), test_options());
        for _ in 0..5 {
            let listing = coordinator.list_records().await.unwrap();
            assert_eq!(listing.records, vec![record(1, "cached")]);
        }
    }
}
