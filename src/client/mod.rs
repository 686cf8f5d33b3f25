//! 注册中心客户端模块
//!
//! 每个 Resolver / Registrar 持有自己的客户端句柄，不存在进程级共享的客户端。

pub mod consul;

pub use consul::ConsulClient;

use async_trait::async_trait;
use std::time::Duration;

use crate::config::ClientOptions;
use crate::discovery::instance::ServiceEntry;
use crate::error::Result;
use crate::registry::ServiceRegistration;

/// 服务健康查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthQuery {
    /// 服务名
    pub service: String,

    /// 标签过滤（可选）
    pub tag: Option<String>,

    /// 只返回健康检查全部通过的实例
    pub passing_only: bool,

    /// 等待水位；注册中心在索引超过该值或等待超时后才返回
    pub wait_index: u64,
}

impl HealthQuery {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            tag: None,
            passing_only: true,
            wait_index: 0,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_passing_only(mut self, passing_only: bool) -> Self {
        self.passing_only = passing_only;
        self
    }

    pub fn with_wait_index(mut self, wait_index: u64) -> Self {
        self.wait_index = wait_index;
        self
    }
}

/// 健康查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    /// 当前实例列表
    pub entries: Vec<ServiceEntry>,

    /// 响应水位（`X-Consul-Index`）
    pub index: u64,
}

/// 注册中心客户端 trait
///
/// 只包含服务发现子系统实际用到的三个接口；测试中可以用脚本化的实现替换。
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// 注册中心地址
    fn address(&self) -> &str;

    /// 查询服务实例（阻塞查询）
    async fn health_service(&self, query: &HealthQuery) -> Result<HealthResponse>;

    /// 注册服务实例；相同 ID 的注册会覆盖旧值
    async fn register_service(&self, registration: &ServiceRegistration) -> Result<()>;

    /// 注销服务实例
    async fn deregister_service(&self, instance_id: &str) -> Result<()>;
}

/// 客户端构建器
pub struct ClientBuilder {
    address: String,
    options: ClientOptions,
    request_timeout: Duration,
}

impl ClientBuilder {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            options: ClientOptions::default(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ConsulClient> {
        ConsulClient::new(self.address, &self.options, self.request_timeout)
    }
}
