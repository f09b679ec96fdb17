//! HTTP Routes
//!
//! API 路由定义，统一挂载在全局前缀下（默认 `/api`）
//!
//! API Endpoints:
//! - /api/health            GET   健康检查
//!
//! 预留的业务模块：identity, proposals, knowledge, agents, export

use axum::{routing::get, Router};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
///
/// `prefix` 形如 `/api`；为空时路由直接挂在根路径
pub fn create_routes(prefix: &str) -> Router<Arc<AppState>> {
    let router = if prefix.is_empty() {
        api_routes()
    } else {
        Router::new().nest(prefix, api_routes())
    };

    router.fallback(handlers::not_found)
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(handlers::health))
}
