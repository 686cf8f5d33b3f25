//! 服务实例与网络地址定义

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 网络地址（`host:port`）
///
/// host 可以是 IP 也可以是主机名，注册中心里两者都可能出现，所以不使用 `SocketAddr`。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkAddress {
    pub host: String,
    pub port: u16,
}

impl NetworkAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// 转换为 HTTP URI（gRPC over h2c）
    pub fn to_http_uri(&self) -> String {
        if self.host.contains(':') {
            // IPv6 字面量
            format!("http://[{}]:{}", self.host, self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// 地址集合快照
///
/// 有序集合，保证同样的成员总是以同样的顺序出现，便于消费方比较和日志输出。
pub type AddressSet = BTreeSet<NetworkAddress>;

/// 健康检查状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passing,
    Warning,
    Critical,
    Maintenance,
}

impl CheckStatus {
    pub fn from_wire(status: &str) -> Self {
        match status {
            "passing" => CheckStatus::Passing,
            "warning" => CheckStatus::Warning,
            "maintenance" => CheckStatus::Maintenance,
            _ => CheckStatus::Critical,
        }
    }
}

/// 注册中心返回的服务实例
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// 实例 ID
    pub id: String,

    /// 服务名
    pub service: String,

    /// 服务地址（可能为空，此时使用节点地址）
    pub address: String,

    /// 节点地址
    pub node_address: String,

    pub port: u16,

    pub tags: Vec<String>,

    /// 所有健康检查中最差的状态；没有检查时视为 passing
    pub status: CheckStatus,
}

impl ServiceEntry {
    /// 是否健康
    pub fn is_healthy(&self) -> bool {
        self.status == CheckStatus::Passing
    }

    /// 转换为网络地址
    ///
    /// 服务地址为空时回退到节点地址；两者都为空时返回 `None`。
    pub fn network_address(&self) -> Option<NetworkAddress> {
        let host = if self.address.is_empty() {
            &self.node_address
        } else {
            &self.address
        };
        if host.is_empty() {
            return None;
        }
        Some(NetworkAddress::new(host.clone(), self.port))
    }
}
