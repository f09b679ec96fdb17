//! Application State
//!
//! 所有请求共享的只读状态

use std::sync::Arc;
use std::time::Instant;

use super::rate_limit::RateLimiter;
use crate::config::{AppConfig, Environment};

/// 应用状态
pub struct AppState {
    /// 当前运行环境
    pub environment: Environment,
    /// 进程启动时间，用于计算 uptime
    pub started_at: Instant,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// 创建应用状态
    pub fn new(environment: Environment, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            environment,
            started_at: Instant::now(),
            rate_limiter,
        }
    }

    /// 根据配置创建应用状态
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.environment,
            Arc::new(RateLimiter::from_config(&config.rate_limit)),
        )
    }

    /// 进程已运行的秒数
    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
