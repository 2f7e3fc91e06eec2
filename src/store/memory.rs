//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 进程内记录存储。

use super::DurableStore;
use crate::error::StoreResult;
use crate::record::{NewRecord, Record, RecordId};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// 进程内记录存储
///
/// 标识符从1开始顺序分配，写锁内完成分配与追加
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableStore for MemoryRecordStore {
    async fn create(&self, record: NewRecord) -> StoreResult<Record> {
        let mut records = self.records.write().await;
        let id = records.last().map(|r| r.id.0 + 1).unwrap_or(1);
        let created = Record {
            id: RecordId(id),
            task: record.task,
            completed: record.completed,
        };
        records.push(created.clone());
        Ok(created)
    }

    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        Ok(self.records.read().await.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
