//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 并发读写测试，包括同一键的未命中合并

#[path = "../common/mod.rs"]
mod common;

use common::{build_coordinator, test_options, CountingStore, FlakyCache};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use todocache::{CoordinatorOptions, ListingSource};
use tokio::sync::Barrier;

fn single_flight_options() -> CoordinatorOptions {
    CoordinatorOptions {
        single_flight: true,
        ..test_options()
    }
}

#[tokio::test]
async fn test_concurrent_writers_all_visible_after_last_write() {
    let store = Arc::new(CountingStore::new());
    let coordinator = Arc::new(build_coordinator(
        Arc::new(FlakyCache::new()),
        store.clone(),
        test_options(),
    ));
    coordinator.list_records().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let c = coordinator.clone();
        handles.push(tokio::spawn(async move {
            c.create_record(&format!("task-{}", i)).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let created = handle.await.unwrap().unwrap();
        assert!(ids.insert(created.record.id), "duplicate id {}", created.record.id);
    }

    let listing = coordinator.list_records().await.unwrap();
    assert_eq!(listing.source, ListingSource::Store);
    assert_eq!(listing.records.len(), 20);
    assert_eq!(store.creates(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_without_gate_may_each_query_store() {
    let store = Arc::new(CountingStore::new());
    store.list_delay_ms.store(50, Ordering::SeqCst);
    let coordinator = Arc::new(build_coordinator(
        Arc::new(FlakyCache::new()),
        store.clone(),
        test_options(),
    ));

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let c = coordinator.clone();
        let b = barrier.clone();
        handles.push(tokio::spawn(async move {
            b.wait().await;
            c.list_records().await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().records.is_empty());
    }

    // 没有闸门时每个并发未命中都可能访问存储，但不会超过请求数
    let lists = store.lists();
    assert!((1..=8).contains(&lists), "lists = {}", lists);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_collapses_concurrent_misses() {
    let store = Arc::new(CountingStore::new());
    store.list_delay_ms.store(50, Ordering::SeqCst);
    let coordinator = Arc::new(build_coordinator(
        Arc::new(FlakyCache::new()),
        store.clone(),
        single_flight_options(),
    ));
    coordinator.create_record("shared").await.unwrap();

    let barrier = Arc::new(Barrier::new(16));
    let mut handles = Vec::new();
    for _ in 0..16 {
        let c = coordinator.clone();
        let b = barrier.clone();
        handles.push(tokio::spawn(async move {
            b.wait().await;
            c.list_records().await
        }));
    }

    let mut sources = Vec::new();
    for handle in handles {
        let listing = handle.await.unwrap().unwrap();
        assert_eq!(listing.records.len(), 1);
        sources.push(listing.source);
    }

    assert_eq!(store.lists(), 1);
    assert_eq!(
        sources.iter().filter(|s| **s == ListingSource::Store).count(),
        1
    );
}

#[tokio::test]
async fn test_single_flight_degraded_cache_still_serves() {
    let cache = Arc::new(FlakyCache::new());
    cache.fail_get.store(true, Ordering::SeqCst);
    let store = Arc::new(CountingStore::new());
    let coordinator = build_coordinator(cache, store.clone(), single_flight_options());

    let listing = coordinator.list_records().await.unwrap();
    assert_eq!(listing.source, ListingSource::StoreDegraded);
}

#[tokio::test]
async fn test_single_flight_write_invalidates() {
    let store = Arc::new(CountingStore::new());
    let coordinator = build_coordinator(
        Arc::new(FlakyCache::new()),
        store.clone(),
        single_flight_options(),
    );

    coordinator.list_records().await.unwrap();
    coordinator.create_record("after").await.unwrap();
    let listing = coordinator.list_records().await.unwrap();

    assert_eq!(listing.records.len(), 1);
    assert_eq!(store.lists(), 2);
}
