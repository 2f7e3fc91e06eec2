//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块负责根据配置构建缓存、持久化存储和协调器，并管理它们的生命周期。

use crate::backend::{CacheStore, MemoryCacheStore, RedisCacheStore};
use crate::config::{CacheBackend, Config};
use crate::coordinator::{CacheAsideCoordinator, CoordinatorOptions};
use crate::error::{CacheError, StoreError};
use crate::key::KeySpace;
use crate::serialization::{JsonSerializer, SerializerEnum};
use crate::store::{DurableStore, MemoryRecordStore, SeaOrmRecordStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// 启动错误
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to connect cache: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to connect store: {0}")]
    Store(#[from] StoreError),
}

/// 应用上下文
///
/// 启动时显式构建，关闭时显式释放；不存在进程级的全局客户端
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub coordinator: Arc<CacheAsideCoordinator>,
}

impl AppContext {
    /// 根据配置连接两个存储并构建协调器
    ///
    /// 持久化存储连接失败会中止启动；缓存连接失败同样中止启动，
    /// 运行期间的缓存故障才走降级路径
    #[instrument(skip(config), level = "info", name = "init_app_context")]
    pub async fn init(config: Config) -> Result<Self, StartupError> {
        let store: Arc<dyn DurableStore> =
            Arc::new(SeaOrmRecordStore::connect(&config.store).await?);

        let cache: Arc<dyn CacheStore> = match config.cache.backend {
            CacheBackend::Redis => Arc::new(RedisCacheStore::connect(&config.cache).await?),
            CacheBackend::Memory => {
                warn!("Using in-process cache backend; entries are not shared between instances");
                Arc::new(MemoryCacheStore::new(config.cache.max_capacity))
            }
        };

        Ok(Self::from_parts(config, cache, store))
    }

    /// 使用进程内缓存和进程内存储构建上下文，不需要外部服务
    pub fn in_memory(config: Config) -> Self {
        let cache = Arc::new(MemoryCacheStore::new(config.cache.max_capacity));
        Self::from_parts(config, cache, Arc::new(MemoryRecordStore::new()))
    }

    /// 使用已构建的存储组装上下文
    pub fn from_parts(
        config: Config,
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn DurableStore>,
    ) -> Self {
        let keys = KeySpace::new(config.cache.key_prefix.as_deref(), &config.cache.collection);
        let json = if config.cache.compress {
            JsonSerializer::with_compression()
        } else {
            JsonSerializer::new()
        };
        let compressed = json.is_compressed();
        let options = CoordinatorOptions::from_config(&config.cache, &config.store);

        info!(
            cache = cache.name(),
            store = store.name(),
            key = %keys.collection_key(),
            ttl_secs = options.ttl.as_secs(),
            single_flight = options.single_flight,
            compressed,
            "Cache-aside coordinator ready"
        );

        let coordinator = CacheAsideCoordinator::new(cache, store, &keys, options)
            .with_serializer(SerializerEnum::Json(json));

        Self {
            config,
            coordinator: Arc::new(coordinator),
        }
    }

    /// 优雅关闭
    ///
    /// 关闭持久化存储连接；缓存连接随句柄释放
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        info!("Shutting down");
        self.coordinator.store().close().await
    }
}
