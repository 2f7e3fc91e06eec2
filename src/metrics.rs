//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了协调器的指标收集和导出功能。

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{span, Level};

/// 指标收集器
///
/// 由协调器持有，克隆后共享同一份数据
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// 请求总数统计
    /// key: (op, result)
    requests_total: Arc<Mutex<BTreeMap<(String, String), u64>>>,
    /// 操作耗时（累计秒数, 次数）
    /// key: (layer, op)
    operation_duration: Arc<Mutex<BTreeMap<(String, String), (f64, u64)>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // 计数器不存在会被 panic 破坏的不变量
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录请求指标
    ///
    /// # 参数
    ///
    /// * `op` - 操作类型（list/create/invalidate）
    /// * `result` - 操作结果（hit/miss/degraded/store_error/...）
    pub fn record_request(&self, op: &str, result: &str) {
        let span = span!(Level::TRACE, "cache_request", op, result);
        let _enter = span.enter();
        let mut map = lock(&self.requests_total);
        *map.entry((op.to_string(), result.to_string())).or_insert(0) += 1;
    }

    /// 记录操作耗时
    ///
    /// # 参数
    ///
    /// * `layer` - 存储层（cache/store）
    /// * `op` - 操作类型（get/set/delete/list_all/create）
    pub fn record_duration(&self, layer: &str, op: &str, duration_secs: f64) {
        let mut map = lock(&self.operation_duration);
        let entry = map
            .entry((layer.to_string(), op.to_string()))
            .or_insert((0.0, 0));
        entry.0 += duration_secs;
        entry.1 += 1;
    }

    /// 获取某个计数
    pub fn count(&self, op: &str, result: &str) -> u64 {
        lock(&self.requests_total)
            .get(&(op.to_string(), result.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// 获取某层某操作的调用次数
    pub fn calls(&self, layer: &str, op: &str) -> u64 {
        lock(&self.operation_duration)
            .get(&(layer.to_string(), op.to_string()))
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// 命中率，没有读请求时返回None
    pub fn hit_rate(&self) -> Option<f64> {
        let hits = self.count("list", "hit");
        let total = hits + self.count("list", "miss") + self.count("list", "degraded");
        if total == 0 {
            None
        } else {
            Some(hits as f64 / total as f64)
        }
    }

    /// 将所有指标格式化为文本导出格式
    pub fn render(&self) -> String {
        let hit_rate = self.hit_rate();
        let reqs = lock(&self.requests_total);
        let dur = lock(&self.operation_duration);

        let mut output = String::new();
        output.push_str("# TYPE todocache_requests_total counter\n");
        for ((op, result), v) in reqs.iter() {
            output.push_str(&format!(
                "todocache_requests_total{{op=\"{}\",result=\"{}\"}} {}\n",
                op, result, v
            ));
        }
        output.push_str("# TYPE todocache_operation_duration_seconds summary\n");
        for ((layer, op), (total, count)) in dur.iter() {
            output.push_str(&format!(
                "todocache_operation_duration_seconds_sum{{layer=\"{}\",op=\"{}\"}} {}\n",
                layer, op, total
            ));
            output.push_str(&format!(
                "todocache_operation_duration_seconds_count{{layer=\"{}\",op=\"{}\"}} {}\n",
                layer, op, count
            ));
        }
        if let Some(rate) = hit_rate {
            output.push_str("# TYPE todocache_cache_hit_ratio gauge\n");
            output.push_str(&format!("todocache_cache_hit_ratio {}\n", rate));
        }
        output
    }
}
