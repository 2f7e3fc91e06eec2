//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 路由处理函数。

use super::ApiError;
use crate::app::AppContext;
use crate::health::{self, HealthReport};
use crate::record::Record;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::time::Duration;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// 创建记录的请求体
#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    #[serde(default)]
    pub task: String,
}

pub async fn list_records(State(ctx): State<AppContext>) -> Result<Json<Vec<Record>>, ApiError> {
    let listing = ctx.coordinator.list_records().await?;
    Ok(Json(listing.records))
}

pub async fn create_record(
    State(ctx): State<AppContext>,
    body: Result<Json<CreateRecordRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    // 请求体格式错误与校验失败使用同样的 400 {error} 响应
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let created = ctx.coordinator.create_record(&body.task).await?;
    Ok((StatusCode::CREATED, Json(created.record)))
}

pub async fn health(State(ctx): State<AppContext>) -> Json<HealthReport> {
    Json(health::probe(&ctx.coordinator, HEALTH_PROBE_TIMEOUT).await)
}

pub async fn metrics(State(ctx): State<AppContext>) -> String {
    ctx.coordinator.metrics().render()
}
