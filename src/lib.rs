//! todocache - 旁路缓存记录服务
//!
//! 以关系型数据库为权威存储、Redis为共享缓存，
//! 读路径缓存故障自动降级，写路径持久化后删除缓存项。

#![doc(html_root_url = "https://docs.rs/todocache/0.1.0")]

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;

pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod health;
pub mod http;
pub mod key;
pub mod metrics;
pub mod record;
pub mod serialization;
pub mod store;
pub mod telemetry;
pub mod utils;

// Re-export commonly used items
pub use app::AppContext;
pub use backend::{CacheStore, MemoryCacheStore, RedisCacheStore};
pub use config::Config;
pub use coordinator::{
    CacheAsideCoordinator, CoordinatorOptions, Created, Invalidation, Listing, ListingSource,
};
pub use error::{CacheError, CoordinatorError, StoreError};
pub use key::{CacheKey, KeySpace};
pub use record::{NewRecord, Record, RecordId};
pub use store::{DurableStore, MemoryRecordStore, SeaOrmRecordStore};

/// todocache 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
