//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存存储的接口以及Redis和内存两种实现。

pub mod memory;
pub mod redis_store;

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

pub use self::memory::MemoryCacheStore;
pub use self::redis_store::RedisCacheStore;

/// 缓存存储特征
///
/// 带过期时间的键值存储。所有方法都可能失败，失败由调用方决定如何降级。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 获取缓存值，不存在或已过期返回None
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// 设置缓存值及其过期时间
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// 删除缓存项
    ///
    /// 键不存在时也返回成功
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// 检查连接是否正常
    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    /// 后端名称，用于日志与健康检查
    fn name(&self) -> &'static str;
}
