//! Rate Limiting
//!
//! 基于固定窗口的按客户端限流，超过限制时返回 429

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use super::error::ApiError;
use super::state::AppState;
use crate::config::RateLimitConfig;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const ANONYMOUS_CLIENT: &str = "anonymous";

/// 单个客户端的计数窗口
#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// 限流判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// 距离当前窗口结束的时间
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// 写入 `x-ratelimit-*` 响应头，拒绝时额外写入 `retry-after`
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        let reset_secs = self.reset_after.as_secs_f64().ceil() as u64;
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset_secs));
        if !self.allowed {
            headers.insert(header::RETRY_AFTER, HeaderValue::from(reset_secs));
        }
    }
}

/// 固定窗口限流器
///
/// 每个客户端一个窗口，窗口内最多 `limit` 个请求。
/// 时间由调用方传入，便于测试。
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    ttl: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(limit: u32, ttl: Duration) -> Self {
        Self {
            limit,
            ttl,
            windows: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.limit, Duration::from_secs(config.ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 记录一次请求并返回判定结果
    pub fn check(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        let window = entry.value_mut();
        if now.saturating_duration_since(window.started_at) >= self.ttl {
            window.started_at = now;
            window.count = 0;
        }

        let reset_after = self
            .ttl
            .saturating_sub(now.saturating_duration_since(window.started_at));

        if window.count >= self.limit {
            return RateLimitDecision {
                allowed: false,
                limit: self.limit,
                remaining: 0,
                reset_after,
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            limit: self.limit,
            remaining: self.limit - window.count,
            reset_after,
        }
    }

    /// 清理已过期的窗口，返回清理数量
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.started_at) < self.ttl);
        before.saturating_sub(self.windows.len())
    }

    /// 当前跟踪的客户端数量
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// 识别客户端：连接地址 > `x-forwarded-for` 第一项 > anonymous
pub fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

/// 限流中间件
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let decision = state.rate_limiter.check(&key, Instant::now());

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(
            client = %key,
            limit = decision.limit,
            uri = %request.uri(),
            "Rate limit exceeded"
        );
        ApiError::too_many_requests().into_response()
    };

    decision.apply_headers(response.headers_mut());
    response
}

/// 周期性清理过期窗口，间隔为窗口长度
pub async fn run_purge_task(limiter: Arc<RateLimiter>) {
    let mut interval = tokio::time::interval(limiter.ttl());
    loop {
        interval.tick().await;
        let purged = limiter.purge_expired(Instant::now());
        if purged > 0 {
            tracing::debug!(
                purged,
                tracked = limiter.tracked_clients(),
                "Purged expired rate limit windows"
            );
        }
    }
}
