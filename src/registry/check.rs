//! 健康检查描述

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::DEFAULT_HEALTH_CHECK_INTERVAL;

/// 健康检查类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// 协议检查（gRPC health），目标格式 `address:port/name`
    Protocol,
    /// HTTP 检查，目标格式 `http://address:port`
    Http,
}

/// 健康检查描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckDescriptor {
    pub kind: CheckKind,
    pub interval: Duration,
    pub target: String,
}

impl HealthCheckDescriptor {
    /// 协议检查
    pub fn protocol(address: &str, port: u16, name: &str, interval: Duration) -> Self {
        Self {
            kind: CheckKind::Protocol,
            interval: effective_interval(interval),
            target: format!("{}:{}/{}", address, port, name),
        }
    }

    /// HTTP 检查
    pub fn http(address: &str, port: u16, interval: Duration) -> Self {
        Self {
            kind: CheckKind::Http,
            interval: effective_interval(interval),
            target: format!("http://{}:{}", address, port),
        }
    }

    /// 注册中心使用的间隔字符串（如 `10s`、`1500ms`）
    pub fn interval_string(&self) -> String {
        format_interval(self.interval)
    }
}

/// 间隔为 0 时使用默认的 10 秒
pub fn effective_interval(interval: Duration) -> Duration {
    if interval.is_zero() {
        DEFAULT_HEALTH_CHECK_INTERVAL
    } else {
        interval
    }
}

pub(crate) fn format_interval(interval: Duration) -> String {
    if interval.subsec_nanos() == 0 {
        format!("{}s", interval.as_secs())
    } else {
        format!("{}ms", interval.as_millis().max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_seconds_and_millis() {
        assert_eq!(format_interval(Duration::from_secs(10)), "10s");
        assert_eq!(format_interval(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_interval(Duration::from_nanos(10)), "1ms");
    }
}
