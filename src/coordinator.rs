//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 旁路缓存协调器
//!
//! 读：先查缓存，命中直接返回；未命中则查询持久化存储并写回缓存。
//! 写：先持久化，成功后删除缓存项，由下一次读取重新填充。
//!
//! 缓存故障一律降级（fail-open），持久化存储故障一律失败（fail-closed）。
//! 协调器不在“查缓存→查存储”序列上持有锁；可选的单飞闸门只合并同一键的并发未命中。

use crate::backend::CacheStore;
use crate::config::{CacheConfig, StoreConfig};
use crate::error::{CacheError, CacheResult, CoordinatorError, Result};
use crate::key::{CacheKey, KeySpace};
use crate::metrics::Metrics;
use crate::record::{NewRecord, Record};
use crate::serialization::{Serializer, SerializerEnum};
use crate::store::DurableStore;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// 任务内容的最大字符数
pub const MAX_TASK_CHARS: usize = 1024;

/// 协调器参数
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// 集合快照的过期时间
    pub ttl: Duration,
    /// 单次缓存调用的超时时间
    pub cache_timeout: Duration,
    /// 单次存储调用的超时时间
    pub store_timeout: Duration,
    /// 是否合并同一键的并发未命中
    pub single_flight: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            cache_timeout: Duration::from_millis(1000),
            store_timeout: Duration::from_millis(3000),
            single_flight: false,
        }
    }
}

impl CoordinatorOptions {
    pub fn from_config(cache: &CacheConfig, store: &StoreConfig) -> Self {
        Self {
            ttl: cache.ttl(),
            cache_timeout: cache.command_timeout(),
            store_timeout: store.command_timeout(),
            single_flight: cache.single_flight,
        }
    }
}

/// 列表结果的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    /// 缓存命中
    Cache,
    /// 缓存未命中，已从存储加载并写回缓存
    Store,
    /// 缓存不可用，直接从存储加载，未写回
    StoreDegraded,
}

/// 列表结果
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub records: Vec<Record>,
    pub source: ListingSource,
}

/// 写后失效的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Invalidated,
    /// 删除失败，旧快照最多残留一个TTL
    Failed(String),
}

/// 创建结果
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub record: Record,
    pub invalidation: Invalidation,
}

enum CacheRead {
    Hit(Vec<Record>),
    Miss,
    Unavailable,
}

/// 旁路缓存协调器
pub struct CacheAsideCoordinator {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn DurableStore>,
    key: CacheKey,
    serializer: SerializerEnum,
    options: CoordinatorOptions,
    metrics: Metrics,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for CacheAsideCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAsideCoordinator")
            .field("cache", &self.cache.name())
            .field("store", &self.store.name())
            .field("key", &self.key)
            .field("options", &self.options)
            .finish()
    }
}

impl CacheAsideCoordinator {
    /// 创建协调器
    ///
    /// # 参数
    ///
    /// * `cache` - 缓存存储
    /// * `store` - 持久化存储
    /// * `keys` - 缓存键空间
    /// * `options` - 超时、TTL等参数
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn DurableStore>,
        keys: &KeySpace,
        options: CoordinatorOptions,
    ) -> Self {
        Self {
            cache,
            store,
            key: keys.collection_key(),
            serializer: SerializerEnum::default(),
            options,
            metrics: Metrics::new(),
            in_flight: DashMap::new(),
        }
    }

    /// 替换快照序列化器
    pub fn with_serializer(mut self, serializer: SerializerEnum) -> Self {
        self.serializer = serializer;
        self
    }

    /// 使用外部指标收集器
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn collection_key(&self) -> &CacheKey {
        &self.key
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// 列出全部记录
    ///
    /// # 返回值
    ///
    /// 返回集合快照及其来源；命中路径上的数据最多落后一个TTL。
    /// 持久化存储失败或超时返回 `StoreUnavailable`，且不会写入缓存。
    #[instrument(skip(self), level = "debug", fields(key = %self.key))]
    pub async fn list_records(&self) -> Result<Listing> {
        match self.read_cache().await {
            CacheRead::Hit(records) => return Ok(self.hit(records)),
            CacheRead::Miss => {}
            CacheRead::Unavailable => return self.list_degraded().await,
        }

        if !self.options.single_flight {
            return self.populate().await;
        }

        let gate = self
            .in_flight
            .entry(self.key.to_string())
            .or_default()
            .value()
            .clone();
        let result = {
            let _guard = gate.lock().await;
            // 排队期间可能已有其他请求完成填充
            match self.read_cache().await {
                CacheRead::Hit(records) => Ok(self.hit(records)),
                CacheRead::Miss => self.populate().await,
                CacheRead::Unavailable => self.list_degraded().await,
            }
        };
        drop(gate);
        self.in_flight
            .remove_if(self.key.as_str(), |_, g| Arc::strong_count(g) == 1);
        result
    }

    /// 创建记录
    ///
    /// # 参数
    ///
    /// * `task` - 任务内容，不能为空
    ///
    /// # 返回值
    ///
    /// 返回创建的记录以及失效结果。失效失败不会使操作失败，只记录告警。
    #[instrument(
        skip(self, task),
        level = "debug",
        fields(key = %self.key, task_len = task.len())
    )]
    pub async fn create_record(&self, task: &str) -> Result<Created> {
        if let Err(e) = validate_task(task) {
            self.metrics.record_request("create", "validation_error");
            return Err(e);
        }

        let record = match self
            .timed(
                "store",
                "create",
                self.options.store_timeout,
                self.store.create(NewRecord::new(task)),
            )
            .await
        {
            Some(Ok(record)) => record,
            Some(Err(e)) => {
                error!("Failed to persist record: {}", e);
                self.metrics.record_request("create", "store_error");
                return Err(e.into());
            }
            None => {
                error!(
                    "Persisting record timed out after {}ms",
                    self.options.store_timeout.as_millis()
                );
                self.metrics.record_request("create", "store_error");
                return Err(CoordinatorError::StoreUnavailable(format!(
                    "store create timed out after {}ms",
                    self.options.store_timeout.as_millis()
                )));
            }
        };

        let invalidation = match self
            .timed(
                "cache",
                "delete",
                self.options.cache_timeout,
                self.cache.delete(self.key.as_str()),
            )
            .await
        {
            Some(Ok(())) => Invalidation::Invalidated,
            Some(Err(e)) => Invalidation::Failed(e.to_string()),
            None => Invalidation::Failed(format!(
                "cache delete timed out after {}ms",
                self.options.cache_timeout.as_millis()
            )),
        };

        match &invalidation {
            Invalidation::Invalidated => {
                self.metrics.record_request("create", "ok");
                info!(id = %record.id, "Record created, cache invalidated");
            }
            Invalidation::Failed(reason) => {
                self.metrics.record_request("create", "invalidation_failed");
                warn!(
                    id = %record.id,
                    "Record created but cache invalidation failed, \
                     stale snapshot may linger up to {}s: {}",
                    self.options.ttl.as_secs(),
                    reason
                );
            }
        }

        Ok(Created {
            record,
            invalidation,
        })
    }

    /// 主动删除集合快照
    ///
    /// 与写路径不同，这里把缓存错误返回给调用方
    #[instrument(skip(self), level = "info", fields(key = %self.key))]
    pub async fn invalidate(&self) -> CacheResult<()> {
        match self
            .timed(
                "cache",
                "delete",
                self.options.cache_timeout,
                self.cache.delete(self.key.as_str()),
            )
            .await
        {
            Some(result) => {
                self.metrics.record_request(
                    "invalidate",
                    if result.is_ok() { "ok" } else { "cache_error" },
                );
                result
            }
            None => {
                self.metrics.record_request("invalidate", "cache_error");
                Err(CacheError::Timeout(format!(
                    "cache delete timed out after {}ms",
                    self.options.cache_timeout.as_millis()
                )))
            }
        }
    }

    fn hit(&self, records: Vec<Record>) -> Listing {
        self.metrics.record_request("list", "hit");
        debug!("Cache hit, {} records", records.len());
        Listing {
            records,
            source: ListingSource::Cache,
        }
    }

    async fn read_cache(&self) -> CacheRead {
        match self
            .timed("cache", "get", self.options.cache_timeout, self.cache.get(self.key.as_str()))
            .await
        {
            Some(Ok(Some(bytes))) => match self.serializer.deserialize::<Vec<Record>>(&bytes) {
                Ok(records) => CacheRead::Hit(records),
                Err(e) => {
                    // 无法解析的条目按未命中处理，随后会被覆盖
                    warn!("Discarding undecodable cache entry: {}", e);
                    CacheRead::Miss
                }
            },
            Some(Ok(None)) => CacheRead::Miss,
            Some(Err(e)) => {
                warn!("Cache degraded on get, falling back to store: {}", e);
                CacheRead::Unavailable
            }
            None => {
                warn!(
                    "Cache degraded on get, timed out after {}ms, falling back to store",
                    self.options.cache_timeout.as_millis()
                );
                CacheRead::Unavailable
            }
        }
    }

    async fn populate(&self) -> Result<Listing> {
        let records = self.load_from_store().await?;
        self.metrics.record_request("list", "miss");

        match self.serializer.serialize(&records) {
            Ok(bytes) => {
                match self
                    .timed(
                        "cache",
                        "set",
                        self.options.cache_timeout,
                        self.cache
                            .set_with_ttl(self.key.as_str(), bytes, self.options.ttl),
                    )
                    .await
                {
                    Some(Ok(())) => debug!("Cache populated with {} records", records.len()),
                    Some(Err(e)) => {
                        self.metrics.record_request("list", "cache_write_failed");
                        warn!("Cache degraded on set, snapshot not cached: {}", e);
                    }
                    None => {
                        self.metrics.record_request("list", "cache_write_failed");
                        warn!(
                            "Cache degraded on set, timed out after {}ms",
                            self.options.cache_timeout.as_millis()
                        );
                    }
                }
            }
            Err(e) => {
                self.metrics.record_request("list", "cache_write_failed");
                warn!("Failed to serialize snapshot, not cached: {}", e);
            }
        }

        Ok(Listing {
            records,
            source: ListingSource::Store,
        })
    }

    async fn list_degraded(&self) -> Result<Listing> {
        let records = self.load_from_store().await?;
        self.metrics.record_request("list", "degraded");
        Ok(Listing {
            records,
            source: ListingSource::StoreDegraded,
        })
    }

    async fn load_from_store(&self) -> Result<Vec<Record>> {
        match self
            .timed("store", "list_all", self.options.store_timeout, self.store.list_all())
            .await
        {
            Some(Ok(records)) => Ok(records),
            Some(Err(e)) => {
                error!("Failed to list records from store: {}", e);
                self.metrics.record_request("list", "store_error");
                Err(e.into())
            }
            None => {
                error!(
                    "Listing records timed out after {}ms",
                    self.options.store_timeout.as_millis()
                );
                self.metrics.record_request("list", "store_error");
                Err(CoordinatorError::StoreUnavailable(format!(
                    "store list timed out after {}ms",
                    self.options.store_timeout.as_millis()
                )))
            }
        }
    }

    /// 带超时执行一次I/O调用并记录耗时，超时返回None
    async fn timed<T, F>(&self, layer: &str, op: &str, limit: Duration, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let start = Instant::now();
        let result = timeout(limit, fut).await.ok();
        self.metrics
            .record_duration(layer, op, start.elapsed().as_secs_f64());
        result
    }
}

/// 校验任务内容
///
/// 空白或过长的任务返回 `ValidationError`
pub fn validate_task(task: &str) -> Result<()> {
    if task.trim().is_empty() {
        return Err(CoordinatorError::Validation(
            "task must be a non-empty string".to_string(),
        ));
    }
    if task.chars().count() > MAX_TASK_CHARS {
        return Err(CoordinatorError::Validation(format!(
            "task must be at most {} characters",
            MAX_TASK_CHARS
        )));
    }
    Ok(())
}
