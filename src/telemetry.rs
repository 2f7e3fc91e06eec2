//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了日志输出和链路追踪的初始化。

use crate::config::TelemetryConfig;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// 初始化日志与链路追踪
///
/// 此函数应该在应用程序启动时调用一次。`RUST_LOG` 存在时优先于配置中的过滤规则。
/// 启用 `otel` 时额外挂载 OpenTelemetry 层；未配置导出器时 span 只在进程内流转。
///
/// # 返回值
///
/// 返回 tracer provider（未启用时为None），关闭时应调用 `shutdown`
pub fn init_tracing(config: &TelemetryConfig) -> Option<SdkTracerProvider> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let provider = config.otel.then(|| SdkTracerProvider::builder().build());
    let otel_layer = provider.as_ref().map(|p| {
        opentelemetry::global::set_tracer_provider(p.clone());
        tracing_opentelemetry::layer().with_tracer(p.tracer(config.service_name.clone()))
    });

    // 可能已被测试或宿主程序初始化
    let _ = Registry::default()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init();

    provider
}

/// 关闭链路追踪
pub fn shutdown(provider: Option<SdkTracerProvider>) {
    if provider.is_some() {
        opentelemetry::global::shutdown_tracer_provider();
    }
}
