//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, LOG_LEVELS};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "SENTINEL";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `SENTINEL_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `SENTINEL_ENVIRONMENT=production`
/// - `SENTINEL_SERVER__PORT=8080`
/// - `SENTINEL_SERVER__CORS_ORIGIN=https://app.example.com`
/// - `SENTINEL_RATE_LIMIT__LIMIT=200`
/// - `SENTINEL_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("environment", "development")?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3001)?
        .set_default("server.global_prefix", "api")?
        .set_default("server.cors_origin", "*")?
        .set_default("server.request_timeout_secs", 30)?
        .set_default("rate_limit.ttl_secs", 60)?
        .set_default("rate_limit.limit", 100)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?
        .set_default("jwt.expires_in", "7d")?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: SENTINEL_SERVER__PORT=8080
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
///
/// 收集所有问题后一次性返回，而不是遇到第一个错误就退出
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    if config.server.port == 0 {
        problems.push("server.port cannot be 0".to_string());
    }

    if config.server.request_timeout_secs == 0 {
        problems.push("server.request_timeout_secs cannot be 0".to_string());
    }

    if config.server.cors_origin.trim().is_empty() {
        problems.push("server.cors_origin cannot be empty".to_string());
    } else if let Some(origins) = config.server.cors_origins() {
        for origin in origins
            .iter()
            .filter(|o| http::HeaderValue::from_str(o).is_err())
        {
            problems.push(format!("server.cors_origin contains invalid origin '{}'", origin));
        }
    }

    if config.rate_limit.ttl_secs == 0 {
        problems.push("rate_limit.ttl_secs cannot be 0".to_string());
    }

    if config.rate_limit.limit == 0 {
        problems.push("rate_limit.limit cannot be 0".to_string());
    }

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        problems.push(format!(
            "log.level must be one of [{}], got '{}'",
            LOG_LEVELS.join(", "),
            config.log.level
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(problems.join("; ")))
    }
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("API Base URL: {}", config.server.public_base_url());
    tracing::info!("CORS Origin: {}", config.server.cors_origin);
    tracing::info!("Request Timeout: {}s", config.server.request_timeout_secs);
    tracing::info!(
        "Rate Limit: {} requests / {}s",
        config.rate_limit.limit,
        config.rate_limit.ttl_secs
    );
    tracing::info!("Database Configured: {}", config.database_url.is_some());
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
