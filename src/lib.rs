//! Sentinel - RFP 响应平台后端服务
//!
//! 配置层 (config/):
//! - 默认值 / TOML 文件 / 环境变量 多源合并与校验
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 健康检查、全局中间件管线（校验、日志、限流、安全响应头）
//! - 统一响应信封：成功 `{ "data": ... }`，失败 `{ statusCode, timestamp, path, method, message }`

pub mod config;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
