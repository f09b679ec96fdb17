//! Sentinel - RFP 响应平台 API
//!
//! 启动流程：加载配置 → 初始化日志 → 创建状态 → 启动 HTTP 服务器

use std::sync::Arc;

use sentinel::config::{load_config, print_config, AppConfig};
use sentinel::infrastructure::http::rate_limit::run_purge_task;
use sentinel::infrastructure::http::{shutdown_signal, AppState, HttpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Sentinel RFP API v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    let state = Arc::new(AppState::from_config(&config));

    // 定期清理过期的限流窗口
    let purge_handle = tokio::spawn(run_purge_task(state.rate_limiter.clone()));

    let server = HttpServer::new(config.server.clone(), state);

    server.run_with_shutdown(shutdown_signal()).await?;

    purge_handle.abort();
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的级别；生产环境或 `log.json = true` 时输出 JSON
fn init_tracing(config: &AppConfig) {
    let level = config.log.tracing_level();
    let log_filter = format!("{},sentinel={},tower_http=debug", level, level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json || config.environment.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
