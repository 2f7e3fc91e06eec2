//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 协调器错误到HTTP响应的映射。

use crate::error::CoordinatorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// HTTP层错误
#[derive(Debug)]
pub enum ApiError {
    /// 请求参数不合法
    BadRequest(String),
    /// 服务内部错误
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::Validation(msg) => ApiError::BadRequest(msg),
            CoordinatorError::StoreUnavailable(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
