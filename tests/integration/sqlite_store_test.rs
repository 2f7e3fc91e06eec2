//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! Sea-ORM SQLite存储测试

#[path = "../common/mod.rs"]
mod common;

use common::{build_coordinator, setup_logging, test_options, FlakyCache};
use secrecy::SecretString;
use std::sync::Arc;
use todocache::config::StoreConfig;
use todocache::store::{DurableStore, SeaOrmRecordStore};
use todocache::{ListingSource, NewRecord, RecordId};

fn sqlite_config(url: &str) -> StoreConfig {
    StoreConfig {
        connection_string: SecretString::new(url.to_string().into()),
        ..StoreConfig::default()
    }
}

#[tokio::test]
async fn test_memory_sqlite_create_and_list() {
    setup_logging();
    let store = SeaOrmRecordStore::connect(&sqlite_config("sqlite::memory:"))
        .await
        .unwrap();
    assert_eq!(store.name(), "sqlite");
    assert!(store.list_all().await.unwrap().is_empty());

    let first = store.create(NewRecord::new("first")).await.unwrap();
    let second = store.create(NewRecord::new("second")).await.unwrap();
    assert!(first.id < second.id);
    assert!(!first.completed);

    let all = store.list_all().await.unwrap();
    assert_eq!(all, vec![first, second]);

    store.ping().await.unwrap();
}

#[tokio::test]
async fn test_file_sqlite_persists_across_connections() {
    setup_logging();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("records.db").display());

    let store = SeaOrmRecordStore::connect(&sqlite_config(&url)).await.unwrap();
    let created = store.create(NewRecord::new("durable")).await.unwrap();
    assert_eq!(created.id, RecordId(1));
    store.close().await.unwrap();

    // 再次连接时表已存在，建表语句不应报错
    let reopened = SeaOrmRecordStore::connect(&sqlite_config(&url)).await.unwrap();
    let all = reopened.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].task, "durable");
    reopened.close().await.unwrap();
}

#[tokio::test]
async fn test_coordinator_over_sqlite() {
    setup_logging();
    let store = Arc::new(
        SeaOrmRecordStore::connect(&sqlite_config("sqlite::memory:"))
            .await
            .unwrap(),
    );
    let coordinator = build_coordinator(Arc::new(FlakyCache::new()), store, test_options());

    let created = coordinator.create_record("buy milk").await.unwrap();
    let listing = coordinator.list_records().await.unwrap();
    assert_eq!(listing.records, vec![created.record]);
    assert_eq!(listing.source, ListingSource::Store);

    let again = coordinator.list_records().await.unwrap();
    assert_eq!(again.source, ListingSource::Cache);
}
