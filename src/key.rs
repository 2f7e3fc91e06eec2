//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 缓存键的派生规则。

use std::fmt;

/// 键的最大长度
pub const MAX_KEY_LENGTH: usize = 256;

/// 缓存键空间
///
/// 由可选前缀和集合名组成，整个集合的快照存放在 `{prefix}:{collection}:all` 下。
/// 以后若按记录缓存，可在同一键空间下派生 `{prefix}:{collection}:id:{id}`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: Option<String>,
    collection: String,
}

impl KeySpace {
    /// 创建键空间
    ///
    /// # 参数
    ///
    /// * `prefix` - 键前缀，None 或空字符串表示不加前缀
    /// * `collection` - 集合名称
    pub fn new(prefix: Option<&str>, collection: &str) -> Self {
        Self {
            prefix: prefix
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| p.trim_end_matches(':').to_string()),
            collection: collection.trim().to_string(),
        }
    }

    /// 整个集合快照的缓存键
    pub fn collection_key(&self) -> CacheKey {
        match &self.prefix {
            Some(prefix) => CacheKey(format!("{}:{}:all", prefix, self.collection)),
            None => CacheKey(format!("{}:all", self.collection)),
        }
    }
}

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
