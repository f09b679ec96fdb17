//! Data Transfer Objects
//!
//! 统一成功响应结构：处理器的返回值原样放在 `data` 字段中

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// 统一 API 响应格式 `{ "data": T }`
///
/// 不做任何校验或转换，也不附加其他字段。
/// 处理器需要自定义状态码时返回 `(StatusCode, ApiResponse<T>)`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// 处理器返回值类型
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// 将处理器结果包装为成功信封
pub fn wrap<T>(data: T) -> ApiResponse<T> {
    ApiResponse { data }
}

impl<T> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        wrap(data)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        // 序列化失败交给错误归一化处理
        match serde_json::to_vec(&self) {
            Ok(bytes) => (
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )],
                bytes,
            )
                .into_response(),
            Err(err) => ApiError::from(err).into_response(),
        }
    }
}
