//! 服务注册模块
//!
//! 将服务实例及其健康检查描述发布到注册中心

pub mod check;
pub mod registrar;

pub use check::{CheckKind, HealthCheckDescriptor};
pub use registrar::{Registrar, ServiceInstanceDescriptor, ServiceRegistration};
