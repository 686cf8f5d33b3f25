//! 连接目标解析
//!
//! 目标格式：`host[:port]/name`，可以带 `scheme://` 前缀。

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::config::DEFAULT_REGISTRY_PORT;
use crate::error::{DiscoveryError, Result};

static TARGET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9._-]+)(?::([0-9]{1,5}))?/([A-Za-z_]+)$").expect("valid target pattern")
});

/// 解析后的连接目标，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    host: String,
    port: u16,
    service_name: String,
}

impl Target {
    /// 注册中心主机
    pub fn host(&self) -> &str {
        &self.host
    }

    /// 注册中心端口
    pub fn port(&self) -> u16 {
        self.port
    }

    /// 要解析的服务名
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 注册中心地址 `host:port`
    pub fn registry_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.service_name)
    }
}

impl std::str::FromStr for Target {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

/// 解析 `host[:port]/name`
///
/// - 空字符串：`MissingAddress`
/// - 不符合语法（含超出 u16 的端口）：`InvalidUri`
/// - 省略端口时使用 8500
pub fn parse(raw: &str) -> Result<Target> {
    if raw.is_empty() {
        return Err(DiscoveryError::missing_address());
    }

    let groups = TARGET_PATTERN
        .captures(raw)
        .ok_or_else(|| DiscoveryError::invalid_uri(raw))?;

    let port = match groups.get(2) {
        Some(port) => port
            .as_str()
            .parse::<u16>()
            .map_err(|_| DiscoveryError::invalid_uri(raw))?,
        None => DEFAULT_REGISTRY_PORT,
    };

    Ok(Target {
        host: groups[1].to_string(),
        port,
        service_name: groups[3].to_string(),
    })
}

/// 去掉 `scheme://` 前缀
///
/// 没有前缀时原样返回；前缀与期望的 scheme 不一致时返回 `UnsupportedScheme`。
pub fn strip_scheme<'a>(raw: &'a str, scheme: &str) -> Result<&'a str> {
    match raw.split_once("://") {
        Some((prefix, rest)) if prefix.eq_ignore_ascii_case(scheme) => Ok(rest),
        Some((prefix, _)) => Err(DiscoveryError::unsupported_scheme(prefix)),
        None => Ok(raw),
    }
}
