//! HTTP Error Handling
//!
//! 错误归一化：处理请求过程中出现的任意失败都会被转换为统一的错误信封
//!
//! ```json
//! {
//!   "statusCode": 400,
//!   "timestamp": "2024-01-01T00:00:00.000Z",
//!   "path": "/api/test",
//!   "method": "GET",
//!   "message": "Test error"
//! }
//! ```
//!
//! 失败只分两类：
//! - `Declared`: 显式声明了状态码和面向客户端的消息，原样返回
//! - `Undeclared`: 其他任何失败，统一返回 500 和固定消息，内部细节只进日志

use std::sync::Arc;

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 未声明错误对客户端展示的固定消息
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// API 错误
///
/// 处理器返回 `Result<_, ApiError>`；`?` 作用在 `anyhow::Error`、`std::io::Error`
/// 或 `serde_json::Error` 上时会得到 `Undeclared`。
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// 带有明确状态码和消息的 HTTP 错误
    #[error("{status}: {message}")]
    Declared { status: StatusCode, message: String },

    /// 其他任何失败（程序缺陷、第三方错误等）
    #[error("{0}")]
    Undeclared(Arc<anyhow::Error>),
}

impl ApiError {
    /// 创建 Declared 错误
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Declared {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn too_many_requests() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests")
    }

    /// 创建 Undeclared 错误
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Undeclared(Arc::new(err.into()))
    }

    /// 根据已有响应的状态码推断错误
    ///
    /// 用于框架自身产生的错误响应（405、超时、panic 等）：
    /// 4xx 视为 Declared，消息取标准原因短语；5xx 一律视为 Undeclared。
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_client_error() {
            Self::new(status, status.canonical_reason().unwrap_or("Error"))
        } else {
            Self::internal(anyhow::anyhow!("request failed with status {}", status))
        }
    }

    /// 写入响应的 HTTP 状态码
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Declared { status, .. } => *status,
            ApiError::Undeclared(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Undeclared(Arc::new(err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

/// 发生失败的请求上下文
///
/// 在处理器运行前捕获，之后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// 请求路径（包含查询字符串）
    pub path: String,
    pub method: Method,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }

    pub fn from_parts(method: &Method, uri: &Uri) -> Self {
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        Self::new(method.clone(), path)
    }
}

/// 统一错误响应格式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub method: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// ISO-8601 时间戳，毫秒精度，UTC
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 将失败归一化为错误信封
///
/// 纯函数：不记录日志、不访问共享状态
pub fn normalize(fault: &ApiError, context: &RequestContext, at: DateTime<Utc>) -> ErrorEnvelope {
    let message = match fault {
        ApiError::Declared { message, .. } => message.clone(),
        ApiError::Undeclared(_) => INTERNAL_ERROR_MESSAGE.to_string(),
    };

    ErrorEnvelope {
        status_code: fault.status().as_u16(),
        timestamp: format_timestamp(at),
        path: context.path.clone(),
        method: context.method.to_string(),
        message,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Declared { status, message } if status.is_server_error() => {
                tracing::error!(status = status.as_u16(), error = %message, "Declared server error");
            }
            ApiError::Declared { status, message } => {
                tracing::warn!(status = status.as_u16(), error = %message, "Request failed");
            }
            ApiError::Undeclared(err) => {
                tracing::error!(error = %err, "Internal server error");
            }
        }

        // 此处拿不到请求上下文，先输出空路径的信封；
        // normalize_errors 中间件会根据扩展中的 ApiError 重新生成完整信封
        let unknown = RequestContext::new(Method::GET, "");
        let mut envelope = normalize(&self, &unknown, Utc::now());
        envelope.method = String::new();

        let mut response = envelope.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_declared_fault_is_surfaced_verbatim() {
        let fault = ApiError::bad_request("Test error");
        let context = RequestContext::new(Method::GET, "/test");

        let envelope = normalize(&fault, &context, at());

        assert_eq!(envelope.status_code, 400);
        assert_eq!(envelope.path, "/test");
        assert_eq!(envelope.method, "GET");
        assert_eq!(envelope.message, "Test error");
        assert_eq!(envelope.timestamp, "2024-05-01T12:30:00.000Z");
    }

    #[test]
    fn test_undeclared_fault_hides_detail() {
        let fault = ApiError::internal(anyhow::anyhow!("Unexpected error"));
        let context = RequestContext::new(Method::POST, "/test");

        let envelope = normalize(&fault, &context, at());

        assert_eq!(envelope.status_code, 500);
        assert_eq!(envelope.method, "POST");
        assert_eq!(envelope.message, INTERNAL_ERROR_MESSAGE);
        assert!(!serde_json::to_string(&envelope)
            .unwrap()
            .contains("Unexpected error"));
    }

    #[test]
    fn test_declared_status_and_message_pass_through() {
        let cases = [
            (StatusCode::UNAUTHORIZED, "Unauthorized"),
            (StatusCode::NOT_FOUND, "Proposal 42 not found"),
            (StatusCode::CONFLICT, ""),
            (StatusCode::SERVICE_UNAVAILABLE, "Maintenance window"),
        ];
        let context = RequestContext::new(Method::DELETE, "/api/proposals/42");

        for (status, message) in cases {
            let envelope = normalize(&ApiError::new(status, message), &context, at());
            assert_eq!(envelope.status(), status);
            assert_eq!(envelope.message, message);
        }
    }

    #[test]
    fn test_envelope_serializes_with_camel_case_keys() {
        let envelope = normalize(
            &ApiError::bad_request("Test error"),
            &RequestContext::new(Method::GET, "/test"),
            at(),
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "statusCode": 400,
                "timestamp": "2024-05-01T12:30:00.000Z",
                "path": "/test",
                "method": "GET",
                "message": "Test error",
            })
        );
    }

    #[test]
    fn test_request_context_keeps_query_string() {
        let uri: Uri = "/api/search?q=rfp".parse().unwrap();
        let context = RequestContext::from_parts(&Method::GET, &uri);
        assert_eq!(context.path, "/api/search?q=rfp");
    }

    #[test]
    fn test_from_status() {
        let fault = ApiError::from_status(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(fault.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(matches!(
            fault,
            ApiError::Declared { ref message, .. } if message == "Method Not Allowed"
        ));

        let fault = ApiError::from_status(StatusCode::BAD_GATEWAY);
        assert!(matches!(fault, ApiError::Undeclared(_)));
        assert_eq!(fault.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_io_error_converts_to_undeclared() {
        let err: ApiError = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire").into();
        assert!(matches!(err, ApiError::Undeclared(_)));
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn test_into_response_sets_status_and_keeps_fault() {
        let response = ApiError::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<ApiError>().is_some());

        let response = ApiError::internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
