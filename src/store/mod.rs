//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了权威持久化存储的接口以及Sea-ORM和内存两种实现。

pub mod memory;
pub mod sea_orm_store;

use crate::error::StoreResult;
use crate::record::{NewRecord, Record};
use async_trait::async_trait;

pub use memory::MemoryRecordStore;
pub use sea_orm_store::SeaOrmRecordStore;

/// 持久化存储特征
///
/// 记录的唯一权威来源。单次调用的原子性由实现保证。
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// 持久化一条新记录并返回分配了标识符的记录
    async fn create(&self, record: NewRecord) -> StoreResult<Record>;

    /// 按插入顺序返回全部记录
    async fn list_all(&self) -> StoreResult<Vec<Record>>;

    /// 检查连接是否正常
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    /// 关闭底层连接
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }

    /// 后端名称，用于日志与健康检查
    fn name(&self) -> &'static str;
}
