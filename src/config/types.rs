//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::fmt;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 运行环境
    #[serde(default)]
    pub environment: Environment,

    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 限流配置
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,

    /// 数据库连接串（预留，当前未使用）
    #[serde(default)]
    pub database_url: Option<String>,

    /// JWT 配置（预留）
    #[serde(default)]
    pub jwt: JwtConfig,
}

/// 运行环境
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
    Staging,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
            Environment::Staging => "staging",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 全局路由前缀（不含斜杠），所有路由挂载在 `/{global_prefix}` 下
    #[serde(default = "default_global_prefix")]
    pub global_prefix: String,

    /// 允许的跨域来源
    /// `*` 表示任意来源，否则为逗号分隔的来源列表
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// 单个请求超时时间（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_global_prefix() -> String {
    "api".to_string()
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            global_prefix: default_global_prefix(),
            cors_origin: default_cors_origin(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 路由前缀路径，例如 `/api`；前缀为空时返回空字符串
    pub fn prefix_path(&self) -> String {
        let trimmed = self.global_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// 获取对外访问的 API Base URL
    pub fn public_base_url(&self) -> String {
        let host = if self.host == "0.0.0.0" {
            "localhost"
        } else {
            &self.host
        };
        format!("http://{}:{}{}", host, self.port, self.prefix_path())
    }

    /// 解析跨域来源列表；`None` 表示允许任意来源
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        if self.cors_origin.trim() == "*" {
            return None;
        }
        Some(
            self.cors_origin
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

/// 限流配置（固定窗口）
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// 窗口长度（秒）
    #[serde(default = "default_rate_limit_ttl")]
    pub ttl_secs: u64,

    /// 每个客户端在单个窗口内允许的请求数
    #[serde(default = "default_rate_limit")]
    pub limit: u32,
}

fn default_rate_limit_ttl() -> u64 {
    60 // 1 分钟
}

fn default_rate_limit() -> u32 {
    100
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_rate_limit_ttl(),
            limit: default_rate_limit(),
        }
    }
}

/// 允许的日志级别
pub const LOG_LEVELS: &[&str] = &["fatal", "error", "warn", "info", "debug", "trace"];

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    /// 可选: fatal, error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LogConfig {
    /// 转换为 tracing 可识别的级别，`fatal` 没有对应级别，按 `error` 处理
    pub fn tracing_level(&self) -> &str {
        match self.level.as_str() {
            "fatal" => "error",
            other => other,
        }
    }
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: Option<String>,

    /// 令牌有效期，例如 `7d`
    #[serde(default = "default_jwt_expires_in")]
    pub expires_in: String,
}

fn default_jwt_expires_in() -> String {
    "7d".to_string()
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            expires_in: default_jwt_expires_in(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.rate_limit.ttl_secs, 60);
        assert_eq!(config.rate_limit.limit, 100);
        assert_eq!(config.jwt.expires_in, "7d");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:3001");
    }

    #[test]
    fn test_prefix_path_trims_slashes() {
        let mut config = ServerConfig::default();
        assert_eq!(config.prefix_path(), "/api");

        config.global_prefix = "/v1/".to_string();
        assert_eq!(config.prefix_path(), "/v1");

        config.global_prefix = String::new();
        assert_eq!(config.prefix_path(), "");
    }

    #[test]
    fn test_public_base_url() {
        let config = ServerConfig::default();
        assert_eq!(config.public_base_url(), "http://localhost:3001/api");
    }

    #[test]
    fn test_cors_origins() {
        let mut config = ServerConfig::default();
        assert!(config.cors_origins().is_none());

        config.cors_origin = "http://localhost:3000, https://app.example.com".to_string();
        assert_eq!(
            config.cors_origins(),
            Some(vec![
                "http://localhost:3000".to_string(),
                "https://app.example.com".to_string(),
            ])
        );
    }

    #[test]
    fn test_fatal_maps_to_error() {
        let config = LogConfig {
            level: "fatal".to_string(),
            json: false,
        };
        assert_eq!(config.tracing_level(), "error");
    }
}
