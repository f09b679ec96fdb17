//! Health Handler
//!
//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::infrastructure::http::dto::{wrap, ApiResult};
use crate::infrastructure::http::error::format_timestamp;
use crate::infrastructure::http::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// 进程运行时长（秒）
    pub uptime: f64,
    pub environment: &'static str,
    pub version: &'static str,
}

/// GET /health - 健康检查
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    Ok(wrap(HealthResponse {
        status: "ok",
        timestamp: format_timestamp(Utc::now()),
        uptime: state.uptime_secs(),
        environment: state.environment.as_str(),
        version: env!("CARGO_PKG_VERSION"),
    }))
}
