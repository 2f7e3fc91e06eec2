//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存层、持久化存储层以及协调器的错误类型。

use thiserror::Error;

/// 缓存存储错误类型
///
/// 缓存错误在协调器中一律被吸收（fail-open），不会作为操作失败返回给调用方
#[derive(Error, Debug)]
pub enum CacheError {
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Redis错误
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// 后端错误
    #[error("Backend error: {0}")]
    BackendError(String),

    /// 超时错误
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// 持久化存储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// Sea-ORM数据库错误
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// 超时错误
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// 后端错误
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// 协调器错误类型
///
/// 只有这两类错误会传播给调用方；缓存降级与失效失败在内部处理
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// 输入不合法，未访问任何存储
    #[error("Validation error: {0}")]
    Validation(String),

    /// 持久化存储不可用或出错
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        CoordinatorError::StoreUnavailable(err.to_string())
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// 配置值不合法
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// 缓存操作结果类型别名
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// 存储操作结果类型别名
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 协调器操作结果类型别名
pub type Result<T> = std::result::Result<T, CoordinatorError>;
