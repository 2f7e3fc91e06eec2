//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! HTTP接入层：把请求翻译成协调器调用并序列化结果。

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::CreateRecordRequest;

use crate::app::AppContext;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// 创建路由
pub fn create_router(ctx: AppContext) -> Router {
    let cors = cors_layer(ctx.config.server.cors_origin.as_deref());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/list-records", get(handlers::list_records))
        .route("/create-record", axum::routing::post(handlers::create_record))
        .route(
            "/todos",
            get(handlers::list_records).post(handlers::create_record),
        )
        .with_state(ctx)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

/// 启动HTTP服务，收到退出信号后停止接收请求并关闭持久化存储
pub async fn serve(ctx: AppContext) -> anyhow::Result<()> {
    let addr: SocketAddr =
        format!("{}:{}", ctx.config.server.host, ctx.config.server.port).parse()?;
    let app = create_router(ctx.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ctx.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
