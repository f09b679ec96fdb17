//! HTTP Middleware
//!
//! - 错误归一化：把所有失败响应改写为统一的错误信封
//! - 请求日志：记录方法、URI、状态码和耗时
//! - 安全响应头

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::error::{normalize, ApiError, RequestContext};

/// 错误归一化中间件
///
/// 请求进入时记录路径和方法，响应返回后：
/// - 携带 `ApiError` 扩展的响应按该错误生成信封
/// - 其他 4xx/5xx 响应（405、超时、panic 等）按状态码推断错误
/// - 成功响应原样返回
///
/// 原响应头（如 `allow`、`retry-after`）会被保留。
pub async fn normalize_errors(request: Request, next: Next) -> Response {
    let context = RequestContext::from_parts(request.method(), request.uri());

    let response = next.run(request).await;
    let status = response.status();

    let fault = match response.extensions().get::<ApiError>() {
        Some(fault) => fault.clone(),
        None if status.is_client_error() || status.is_server_error() => {
            if status.is_server_error() {
                tracing::error!(
                    method = %context.method,
                    path = %context.path,
                    status = status.as_u16(),
                    "Unhandled server error"
                );
            }
            ApiError::from_status(status)
        }
        None => return response,
    };

    render_error(response, &fault, &context)
}

fn render_error(response: Response, fault: &ApiError, context: &RequestContext) -> Response {
    let envelope = normalize(fault, context, Utc::now());

    let (mut parts, _) = response.into_parts();
    parts.extensions.remove::<ApiError>();
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);

    let (rendered, body) = envelope.into_response().into_parts();
    parts.status = rendered.status;
    parts.headers.extend(rendered.headers);

    Response::from_parts(parts, body)
}

/// 请求日志中间件
///
/// 成功请求记录 info，4xx 记录 warn，5xx 记录 error
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms,
            "HTTP client error"
        );
    } else {
        tracing::info!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms,
            "HTTP request"
        );
    }

    response
}

/// 默认安全响应头
const SECURITY_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';\
         frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';\
         script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// 安全响应头中间件，仅在响应中不存在同名头时写入
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for &(name, value) in SECURITY_HEADERS {
        let name = HeaderName::from_static(name);
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    response
}
