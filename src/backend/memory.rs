//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于Moka的进程内缓存存储。

use super::CacheStore;
use crate::error::CacheResult;
use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// 进程内缓存存储
///
/// 值为 (数据, 过期时间)。过期在读取时按 `tokio::time::Instant` 判断，
/// 因此在暂停时钟的测试中可以精确推进时间。
#[derive(Clone)]
pub struct MemoryCacheStore {
    cache: Cache<String, (Vec<u8>, Instant)>,
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MemoryCacheStore {
    /// 创建新的内存缓存存储
    ///
    /// # 参数
    ///
    /// * `capacity` - 最大条目数
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// 判断键当前是否存在且未过期
    pub async fn contains(&self, key: &str) -> bool {
        matches!(self.cache.get(key).await, Some((_, expire_at)) if Instant::now() < expire_at)
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        match self.cache.get(key).await {
            Some((bytes, expire_at)) => {
                if Instant::now() >= expire_at {
                    self.cache.remove(key).await;
                    debug!("memory get: key={}, expired=true, removed", key);
                    return Ok(None);
                }
                debug!("memory get: key={}, found=true", key);
                Ok(Some(bytes))
            }
            None => {
                debug!("memory get: key={}, found=false", key);
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let expire_at = Instant::now() + ttl;
        self.cache.insert(key.to_string(), (value, expire_at)).await;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
