//! 集成测试公共工具：脚本化的注册中心客户端和记录快照的接收端

#![allow(dead_code)]

use async_trait::async_trait;
use flare_discovery_core::{
    AddressSet, CheckStatus, DiscoveryError, HealthQuery, HealthResponse, NetworkAddress,
    RegistryClient, Result, ServiceEntry, ServiceRegistration, StateSink,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// 按脚本依次返回结果的注册中心客户端
///
/// 脚本耗尽后查询会一直挂起（模拟没有变化的长轮询），并通过 `drained` 通知测试。
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<HealthResponse>>>,
    queries: Mutex<Vec<HealthQuery>>,
    registrations: Mutex<Vec<ServiceRegistration>>,
    pub drained: Arc<Notify>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<HealthResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            queries: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
            drained: Arc::new(Notify::new()),
        }
    }

    pub fn queries(&self) -> Vec<HealthQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn registrations(&self) -> Vec<ServiceRegistration> {
        self.registrations.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryClient for ScriptedClient {
    fn address(&self) -> &str {
        "scripted:8500"
    }

    async fn health_service(&self, query: &HealthQuery) -> Result<HealthResponse> {
        self.queries.lock().unwrap().push(query.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                self.drained.notify_one();
                std::future::pending().await
            }
        }
    }

    async fn register_service(&self, registration: &ServiceRegistration) -> Result<()> {
        self.registrations.lock().unwrap().push(registration.clone());
        Ok(())
    }

    async fn deregister_service(&self, _instance_id: &str) -> Result<()> {
        Ok(())
    }
}

/// 记录每次推送的快照
#[derive(Default)]
pub struct RecordingSink {
    snapshots: Mutex<Vec<AddressSet>>,
}

impl RecordingSink {
    pub fn snapshots(&self) -> Vec<AddressSet> {
        self.snapshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateSink for RecordingSink {
    async fn update_addresses(&self, addresses: &AddressSet) -> Result<()> {
        self.snapshots.lock().unwrap().push(addresses.clone());
        Ok(())
    }
}

/// 总是失败的接收端
pub struct FailingSink;

#[async_trait]
impl StateSink for FailingSink {
    async fn update_addresses(&self, _addresses: &AddressSet) -> Result<()> {
        Err(DiscoveryError::internal("sink rejected snapshot"))
    }
}

/// 推送开始后永远不返回的接收端
#[derive(Default)]
pub struct BlockingSink {
    pub started: Arc<Notify>,
}

#[async_trait]
impl StateSink for BlockingSink {
    async fn update_addresses(&self, _addresses: &AddressSet) -> Result<()> {
        self.started.notify_one();
        std::future::pending().await
    }
}

pub fn entry(address: &str, port: u16) -> ServiceEntry {
    ServiceEntry {
        id: format!("svc-{}-{}", address, port),
        service: "svc".to_string(),
        address: address.to_string(),
        node_address: "10.0.0.254".to_string(),
        port,
        tags: vec!["svc".to_string()],
        status: CheckStatus::Passing,
    }
}

pub fn response(index: u64, entries: Vec<ServiceEntry>) -> Result<HealthResponse> {
    Ok(HealthResponse { entries, index })
}

pub fn poll_error() -> Result<HealthResponse> {
    Err(DiscoveryError::poll_failed("connection refused"))
}

pub fn addresses(items: &[(&str, u16)]) -> AddressSet {
    items
        .iter()
        .map(|(host, port)| NetworkAddress::new(*host, *port))
        .collect()
}
