//! 日志初始化
//!
//! 库内部只使用 `tracing` 宏输出日志；嵌入方可以自行安装 subscriber，
//! 也可以调用 [`init_logging`] 按配置安装一个。

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 按配置安装全局 subscriber
///
/// `RUST_LOG` 环境变量优先于配置中的级别。全局 subscriber 已存在时返回错误。
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow::anyhow!("invalid log level {:?}: {}", config.level, e))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()?,
        "pretty" => registry
            .with(fmt::layer().pretty().with_target(true).with_line_number(true))
            .try_init()?,
        "compact" => registry.with(fmt::layer().compact().with_target(true)).try_init()?,
        other => anyhow::bail!("unknown log format: {}", other),
    }

    Ok(())
}
