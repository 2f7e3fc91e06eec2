//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于Redis的缓存存储，支持单节点和集群两种模式。

use super::CacheStore;
use crate::config::{CacheConfig, RedisMode};
use crate::error::{CacheError, CacheResult};
use crate::utils::redaction::RedactedUrl;
use async_trait::async_trait;
use redis::{
    aio::ConnectionManager, cluster::ClusterClient, cluster_async::ClusterConnection, Client,
    FromRedisValue, IntoConnectionInfo,
};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

/// Redis缓存存储
///
/// 单节点模式使用 `ConnectionManager` 自动重连；集群模式持有一个可克隆的集群连接
#[derive(Clone)]
pub enum RedisCacheStore {
    Standalone { manager: ConnectionManager },
    Cluster { connection: ClusterConnection },
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone { .. } => write!(f, "RedisCacheStore::Standalone"),
            Self::Cluster { .. } => write!(f, "RedisCacheStore::Cluster"),
        }
    }
}

impl RedisCacheStore {
    /// 根据配置建立连接
    ///
    /// # 参数
    ///
    /// * `config` - 缓存配置
    ///
    /// # 返回值
    ///
    /// 返回已连接的存储，连接超时返回 `CacheError::Timeout`
    #[instrument(skip(config), level = "info", fields(mode = ?config.mode))]
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        let connect_timeout = Duration::from_millis(config.connection_timeout_ms);
        match config.mode {
            RedisMode::Standalone => {
                let url = config.connection_string.expose_secret();
                let mut info = url.into_connection_info()?;
                if let Some(password) = &config.password {
                    if info.redis.password.is_none() {
                        info.redis.password = Some(password.expose_secret().to_string());
                    }
                }
                let client = Client::open(info)?;
                let manager = timeout(connect_timeout, client.get_connection_manager())
                    .await
                    .map_err(|_| {
                        CacheError::Timeout(format!(
                            "Connection timed out after {}ms. Target: {}",
                            config.connection_timeout_ms,
                            RedactedUrl(url)
                        ))
                    })??;
                info!("Connected to Redis at {}", RedactedUrl(url));
                Ok(Self::Standalone { manager })
            }
            RedisMode::Cluster => {
                if config.nodes.is_empty() {
                    return Err(CacheError::Configuration(
                        "Cluster mode requires at least one node".to_string(),
                    ));
                }
                let mut builder = ClusterClient::builder(config.nodes.clone());
                if let Some(password) = &config.password {
                    builder = builder.password(password.expose_secret().to_string());
                }
                let client = builder.build()?;
                let connection = timeout(connect_timeout, client.get_async_connection())
                    .await
                    .map_err(|_| {
                        CacheError::Timeout(format!(
                            "Cluster connection timed out after {}ms",
                            config.connection_timeout_ms
                        ))
                    })??;
                info!("Connected to Redis cluster ({} seed nodes)", config.nodes.len());
                Ok(Self::Cluster { connection })
            }
        }
    }

    async fn query<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> CacheResult<T> {
        let value = match self {
            Self::Standalone { manager } => cmd.query_async(&mut manager.clone()).await?,
            Self::Cluster { connection } => cmd.query_async(&mut connection.clone()).await?,
        };
        Ok(value)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = self.query(redis::cmd("GET").arg(key)).await?;
        debug!("redis get: key={}, found={}", key, value.is_some());
        Ok(value)
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        // EX 不接受 0
        let secs = ttl.as_secs().max(1);
        self.query::<()>(redis::cmd("SET").arg(key).arg(value).arg("EX").arg(secs))
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> CacheResult<()> {
        let removed: i64 = self.query(redis::cmd("DEL").arg(key)).await?;
        debug!("redis delete: key={}, removed={}", key, removed);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn ping(&self) -> CacheResult<()> {
        let pong: String = self.query(&redis::cmd("PING")).await?;
        debug!("redis ping: {}", pong);
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Standalone { .. } => "redis",
            Self::Cluster { .. } => "redis-cluster",
        }
    }
}
