//! 配置模块
//!
//! 所有识别的选项都在这里显式列出，未出现在配置文件里的字段使用默认值。

use crate::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 健康检查默认间隔（调用方传入 0 时使用）
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// 注册中心默认端口
pub const DEFAULT_REGISTRY_PORT: u16 = 8500;

/// 注册中心允许的最长阻塞等待
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientOptions,
    pub watch: WatchConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.client.interval.is_zero() || self.client.interval > MAX_WAIT_TIME {
            return Err(DiscoveryError::configuration(
                "client.interval_secs must be between 1 and 600",
            ));
        }
        if self.client.pool_size == 0 {
            return Err(DiscoveryError::configuration("client.pool_size must be positive"));
        }
        if self.watch.backoff_base_ms == 0 || self.watch.backoff_max_ms < self.watch.backoff_base_ms {
            return Err(DiscoveryError::configuration(
                "watch.backoff_base_ms must be positive and not exceed watch.backoff_max_ms",
            ));
        }
        Ok(())
    }
}

/// 注册中心客户端选项
///
/// - `interval`: 长轮询的等待时长（注册中心在数据无变化时最多挂起请求的时间）
/// - `pool_size`: 每个注册中心地址保持的最大空闲 HTTP 连接数
/// - `auth_pass`: 注册中心 ACL token，以 `X-Consul-Token` 头发送
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientOptions {
    #[serde(rename = "interval_secs", with = "duration_secs")]
    pub interval: Duration,
    pub pool_size: usize,
    pub auth_pass: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            pool_size: 4,
            auth_pass: None,
        }
    }
}

impl ClientOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_auth_pass(mut self, auth_pass: impl Into<String>) -> Self {
        self.auth_pass = Some(auth_pass.into());
        self
    }
}

/// 监听循环配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// 只返回健康检查全部通过的实例
    pub passing_only: bool,

    /// 按服务名标签过滤（注册时总会附带服务名标签）
    pub filter_by_service_tag: bool,

    /// 连续失败时的退避基准（毫秒）
    pub backoff_base_ms: u64,

    /// 退避上限（毫秒）
    pub backoff_max_ms: u64,

    /// 非阻塞请求的超时（毫秒）；阻塞查询在等待时长之上再加这段余量
    pub request_timeout_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            passing_only: true,
            filter_by_service_tag: true,
            backoff_base_ms: 200,
            backoff_max_ms: 30_000,
            request_timeout_ms: 10_000,
        }
    }
}

impl WatchConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或 EnvFilter 指令（`RUST_LOG` 优先）
    pub level: String,

    /// 输出格式：pretty, compact, json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
