//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了JSON序列化器的实现。

use super::Serializer;
use crate::error::{CacheError, CacheResult};
use serde::{de::DeserializeOwned, Serialize};

/// JSON序列化器
///
/// 实现基于serde_json的序列化和反序列化，可选gzip压缩
#[derive(Clone, Debug, Default)]
pub struct JsonSerializer {
    /// 是否启用压缩
    compress: bool,
}

impl JsonSerializer {
    /// 创建新的JSON序列化器
    pub fn new() -> Self {
        Self { compress: false }
    }

    /// 创建启用压缩的JSON序列化器
    ///
    /// 未启用 `compression` 特性时压缩开关不生效
    pub fn with_compression() -> Self {
        Self { compress: true }
    }

    pub fn is_compressed(&self) -> bool {
        self.compress && cfg!(feature = "compression")
    }
}

impl Serializer for JsonSerializer {
    /// 序列化值为JSON字节数组
    fn serialize<T: Serialize>(&self, value: &T) -> CacheResult<Vec<u8>> {
        let json_bytes =
            serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))?;

        if self.compress {
            gzip(&json_bytes)
        } else {
            Ok(json_bytes)
        }
    }

    /// 从JSON字节数组反序列化值
    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> CacheResult<T> {
        let decoded;
        let json_bytes = if self.compress {
            decoded = gunzip(data)?;
            decoded.as_slice()
        } else {
            data
        };

        serde_json::from_slice(json_bytes).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

#[cfg(feature = "compression")]
fn gzip(data: &[u8]) -> CacheResult<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder
        .write_all(data)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CacheError::Serialization(e.to_string()))
}

#[cfg(feature = "compression")]
fn gunzip(data: &[u8]) -> CacheResult<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(data);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(decoded)
}

// 未启用压缩特性时原样透传
#[cfg(not(feature = "compression"))]
fn gzip(data: &[u8]) -> CacheResult<Vec<u8>> {
    Ok(data.to_vec())
}

#[cfg(not(feature = "compression"))]
fn gunzip(data: &[u8]) -> CacheResult<Vec<u8>> {
    Ok(data.to_vec())
}
