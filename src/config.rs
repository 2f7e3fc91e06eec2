//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了服务的配置结构、文件加载、环境变量覆盖与校验逻辑。

use crate::error::ConfigError;
use crate::key::{KeySpace, MAX_KEY_LENGTH};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 最大允许的TTL（30天）
pub const MAX_TTL_SECS: u64 = 86400 * 30;

/// 顶层配置
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP服务配置
    pub server: ServerConfig,
    /// 持久化存储配置
    pub store: StoreConfig,
    /// 缓存配置
    pub cache: CacheConfig,
    /// 日志与链路追踪配置
    pub telemetry: TelemetryConfig,
}

/// HTTP服务配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 允许的跨域来源，None表示不限制
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origin: None,
        }
    }
}

/// 持久化存储配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StoreConfig {
    /// 数据库连接字符串（sqlite/postgres/mysql）
    pub connection_string: SecretString,
    /// 连接池最大连接数
    pub max_connections: u32,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 单次查询超时时间（毫秒）
    pub command_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection_string: SecretString::new("sqlite::memory:".to_string().into()),
            max_connections: 10,
            connection_timeout_ms: 5000,
            command_timeout_ms: 3000,
        }
    }
}

impl StoreConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// 缓存后端类型
#[derive(Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis
    #[default]
    Redis,
    /// 进程内缓存，仅用于本地运行和测试
    Memory,
}

/// Redis模式
#[derive(Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedisMode {
    /// 单节点
    #[default]
    Standalone,
    /// 集群（多节点寻址）
    Cluster,
}

/// 缓存配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CacheConfig {
    /// 缓存后端
    pub backend: CacheBackend,
    /// Redis模式
    pub mode: RedisMode,
    /// 单节点连接字符串
    pub connection_string: SecretString,
    /// 集群初始节点列表
    pub nodes: Vec<String>,
    /// Redis 密码（可选）
    pub password: Option<SecretString>,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 命令执行超时时间（毫秒）
    pub command_timeout_ms: u64,
    /// 集合快照的过期时间（秒）
    pub ttl_secs: u64,
    /// 键前缀
    pub key_prefix: Option<String>,
    /// 集合名称，用于派生缓存键
    pub collection: String,
    /// 是否对同一键的并发未命中进行合并
    pub single_flight: bool,
    /// 是否压缩缓存值
    pub compress: bool,
    /// 内存后端的最大条目数
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            mode: RedisMode::Standalone,
            connection_string: SecretString::new("redis://127.0.0.1:6379".to_string().into()),
            nodes: Vec::new(),
            password: None,
            connection_timeout_ms: 5000,
            command_timeout_ms: 1000,
            ttl_secs: 3600,
            key_prefix: Some("todocache".to_string()),
            collection: "todos".to_string(),
            single_flight: false,
            compress: false,
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// 日志与链路追踪配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TelemetryConfig {
    /// 日志过滤规则，`RUST_LOG` 优先
    pub log_filter: String,
    /// 是否输出JSON格式日志
    pub json: bool,
    /// 是否启用OpenTelemetry层
    pub otel: bool,
    /// 服务名称
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            json: false,
            otel: false,
            service_name: "todocache".to_string(),
        }
    }
}

impl Config {
    /// 从TOML文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 加载配置
    ///
    /// 有路径时读取文件，否则使用默认值；随后应用环境变量覆盖并校验
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 应用环境变量覆盖
    ///
    /// 支持 `BACKEND_PORT`、`DATABASE_URL`、`REDIS_URL`、`REDIS_CLUSTER_NODES`、
    /// `FRONTEND_URL`、`CACHE_TTL_SECS`
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(port) = env_var("BACKEND_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::Invalid(format!("BACKEND_PORT '{}' is not a port", port))
            })?;
        }

        if let Some(url) = env_var("DATABASE_URL") {
            self.store.connection_string = SecretString::new(url.into());
        }

        if let Some(url) = env_var("REDIS_URL") {
            self.cache.connection_string = SecretString::new(url.into());
        }

        if let Some(nodes) = env_var("REDIS_CLUSTER_NODES") {
            self.cache.nodes = nodes
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
            self.cache.mode = RedisMode::Cluster;
        }

        if let Some(origin) = env_var("FRONTEND_URL") {
            self.server.cors_origin = Some(origin);
        }

        if let Some(ttl) = env_var("CACHE_TTL_SECS") {
            self.cache.ttl_secs = ttl.parse().map_err(|_| {
                ConfigError::Invalid(format!("CACHE_TTL_SECS '{}' is not a number", ttl))
            })?;
        }

        Ok(())
    }

    /// 验证配置
    ///
    /// 检查配置的有效性，确保所有必需的字段都已设置，并且值在合理范围内
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.cache.ttl_secs == 0 {
            return invalid("cache.ttl_secs cannot be zero".to_string());
        }

        if self.cache.ttl_secs > MAX_TTL_SECS {
            return invalid(format!(
                "cache.ttl_secs cannot exceed 30 days ({} seconds)",
                MAX_TTL_SECS
            ));
        }

        if self.cache.collection.trim().is_empty() {
            return invalid("cache.collection cannot be empty".to_string());
        }

        if self.cache.collection.contains(':') {
            return invalid("cache.collection cannot contain ':'".to_string());
        }

        let key = KeySpace::new(self.cache.key_prefix.as_deref(), &self.cache.collection)
            .collection_key();
        if key.as_str().len() > MAX_KEY_LENGTH {
            return invalid(format!(
                "derived cache key exceeds {} bytes",
                MAX_KEY_LENGTH
            ));
        }

        if !(10..=60000).contains(&self.cache.command_timeout_ms) {
            return invalid("cache.command_timeout_ms must be between 10 and 60000 ms".to_string());
        }

        if self.cache.backend == CacheBackend::Redis {
            if !(100..=30000).contains(&self.cache.connection_timeout_ms) {
                return invalid(
                    "cache.connection_timeout_ms must be between 100 and 30000 ms".to_string(),
                );
            }

            match self.cache.mode {
                RedisMode::Standalone => {
                    if self.cache.connection_string.expose_secret().trim().is_empty() {
                        return invalid("cache.connection_string cannot be empty".to_string());
                    }
                }
                RedisMode::Cluster => {
                    if self.cache.nodes.is_empty() {
                        return invalid("cache.nodes must not be empty in cluster mode".to_string());
                    }
                }
            }
        } else if self.cache.max_capacity == 0 {
            return invalid("cache.max_capacity cannot be zero".to_string());
        }

        if self.store.connection_string.expose_secret().trim().is_empty() {
            return invalid("store.connection_string cannot be empty".to_string());
        }

        if !(10..=60000).contains(&self.store.command_timeout_ms) {
            return invalid("store.command_timeout_ms must be between 10 and 60000 ms".to_string());
        }

        if self.store.max_connections == 0 {
            return invalid("store.max_connections cannot be zero".to_string());
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
