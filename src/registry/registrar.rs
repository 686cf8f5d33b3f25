//! 服务注册器

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::check::HealthCheckDescriptor;
use crate::client::{ClientBuilder, RegistryClient};
use crate::config::ClientOptions;
use crate::error::{DiscoveryError, Result};

/// 服务实例描述（注册器的输入）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceDescriptor {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,

    /// 健康检查间隔，0 表示使用默认的 10 秒
    pub health_check_interval: Duration,
}

impl ServiceInstanceDescriptor {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            tags: Vec::new(),
            health_check_interval: Duration::ZERO,
        }
    }

    /// 添加标签
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// 设置健康检查间隔
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// 实例 ID：`name-address-port`
    ///
    /// 由三元组确定，重复注册同一个实例会覆盖而不是新增。
    pub fn instance_id(&self) -> String {
        format!("{}-{}-{}", self.name, self.address, self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(DiscoveryError::invalid_registration("service name is empty"));
        }
        if self.address.is_empty() {
            return Err(DiscoveryError::invalid_registration("service address is empty")
                .with_param("service", self.name.clone()));
        }
        Ok(())
    }

    /// 注册标签：调用方的标签加上服务名标签（去重）
    fn registration_tags(&self) -> Vec<String> {
        let mut tags = self.tags.clone();
        if !tags.iter().any(|t| t == &self.name) {
            tags.insert(0, self.name.clone());
        }
        tags
    }

    fn to_registration(&self, check: HealthCheckDescriptor) -> ServiceRegistration {
        ServiceRegistration {
            id: self.instance_id(),
            name: self.name.clone(),
            address: self.address.clone(),
            port: self.port,
            tags: self.registration_tags(),
            check,
        }
    }
}

/// 写入注册中心的完整注册记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub tags: Vec<String>,
    pub check: HealthCheckDescriptor,
}

/// 服务注册器
///
/// 每次调用只向注册中心写一次；注册之后实例的存活由注册中心通过健康检查负责，本地不跟踪。
/// 注册失败返回错误，是否终止进程由嵌入方决定。
pub struct Registrar {
    client: Arc<dyn RegistryClient>,
}

impl Registrar {
    /// 连接到指定注册中心地址
    pub fn new(registry_address: impl Into<String>, options: &ClientOptions) -> Result<Self> {
        let client = ClientBuilder::new(registry_address)
            .options(options.clone())
            .build()?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// 使用已有的客户端
    pub fn with_client(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    /// 注册服务并附带协议（gRPC）健康检查
    pub async fn register_with_protocol_check(
        &self,
        descriptor: &ServiceInstanceDescriptor,
    ) -> Result<ServiceRegistration> {
        descriptor.validate()?;
        let check = HealthCheckDescriptor::protocol(
            &descriptor.address,
            descriptor.port,
            &descriptor.name,
            descriptor.health_check_interval,
        );
        self.register(descriptor.to_registration(check)).await
    }

    /// 注册服务并附带 HTTP 健康检查
    pub async fn register_with_http_check(
        &self,
        descriptor: &ServiceInstanceDescriptor,
    ) -> Result<ServiceRegistration> {
        descriptor.validate()?;
        let check = HealthCheckDescriptor::http(
            &descriptor.address,
            descriptor.port,
            descriptor.health_check_interval,
        );
        self.register(descriptor.to_registration(check)).await
    }

    /// 注销服务实例
    pub async fn deregister(&self, instance_id: &str) -> Result<()> {
        match self.client.deregister_service(instance_id).await {
            Ok(()) => {
                info!(instance_id = %instance_id, registry = %self.client.address(), "✅ Service deregistered");
                Ok(())
            }
            Err(e) => {
                warn!(instance_id = %instance_id, error = %e, "⚠️ Failed to deregister service");
                Err(e)
            }
        }
    }

    async fn register(&self, registration: ServiceRegistration) -> Result<ServiceRegistration> {
        info!(
            service = %registration.name,
            instance_id = %registration.id,
            registry = %self.client.address(),
            check = ?registration.check.kind,
            interval = %registration.check.interval_string(),
            "Registering service"
        );

        if let Err(e) = self.client.register_service(&registration).await {
            warn!(instance_id = %registration.id, error = %e, "❌ Service registration failed");
            return Err(e);
        }

        info!(instance_id = %registration.id, "✅ Service registered");
        Ok(registration)
    }
}
