//! Fallback Handler

use axum::extract::OriginalUri;
use axum::http::Method;

use crate::infrastructure::http::error::ApiError;

/// 未匹配任何路由的请求
///
/// 嵌套路由会去掉前缀，这里使用原始 URI，并保留查询串
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    let target = uri
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str())
        .unwrap_or_else(|| uri.path());
    ApiError::not_found(format!("Cannot {} {}", method, target))
}
