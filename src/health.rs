//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存和持久化存储的健康探测。

use crate::coordinator::CacheAsideCoordinator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// 组件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

/// 单个组件的健康信息
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub backend: &'static str,
    pub status: ComponentStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 健康报告
///
/// `status` 表示进程存活；缓存不可用时服务仍可工作，只是退化为直接查询存储
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub cache: ComponentHealth,
    pub store: ComponentHealth,
}

impl HealthReport {
    /// 两个组件是否都可用
    pub fn all_up(&self) -> bool {
        self.cache.status == ComponentStatus::Up && self.store.status == ComponentStatus::Up
    }
}

/// 探测缓存和持久化存储
///
/// # 参数
///
/// * `coordinator` - 协调器，提供两个存储的句柄
/// * `limit` - 单次探测的超时时间
pub async fn probe(coordinator: &CacheAsideCoordinator, limit: Duration) -> HealthReport {
    let cache = coordinator.cache();
    let store = coordinator.store();
    let (cache_health, store_health) = tokio::join!(
        probe_one(cache.name(), limit, cache.ping()),
        probe_one(store.name(), limit, store.ping()),
    );

    HealthReport {
        status: "UP",
        timestamp: Utc::now(),
        cache: cache_health,
        store: store_health,
    }
}

async fn probe_one<E, F>(backend: &'static str, limit: Duration, ping: F) -> ComponentHealth
where
    E: std::fmt::Display,
    F: Future<Output = Result<(), E>>,
{
    let start = Instant::now();
    let outcome = timeout(limit, ping).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, error) = match outcome {
        Ok(Ok(())) => (ComponentStatus::Up, None),
        Ok(Err(e)) => (ComponentStatus::Down, Some(e.to_string())),
        Err(_) => (
            ComponentStatus::Down,
            Some(format!("ping timed out after {}ms", limit.as_millis())),
        ),
    };

    if status == ComponentStatus::Down {
        tracing::warn!("Health probe for {} failed: {:?}", backend, error);
    }

    ComponentHealth {
        backend,
        status,
        latency_ms,
        error,
    }
}
