//! 地址快照接收端
//!
//! Watcher 每次成功轮询后推送完整快照；接收端必须能容忍重复的相同快照。

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tonic::transport::channel::Change;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};

use crate::discovery::instance::{AddressSet, NetworkAddress};
use crate::error::{DiscoveryError, ErrorCode, Result};

/// 地址快照接收端 trait
///
/// 语义是整体替换而不是增量：每次调用传入的都是完整的地址集合。
#[async_trait]
pub trait StateSink: Send + Sync {
    async fn update_addresses(&self, addresses: &AddressSet) -> Result<()>;
}

/// 基于 `tokio::sync::watch` 的接收端
///
/// 消费方通过 Receiver 随时读取最新快照，或等待下一次变化。
pub struct WatchSink {
    tx: watch::Sender<AddressSet>,
}

impl WatchSink {
    /// 创建接收端和对应的 Receiver（初始为空集合）
    pub fn channel() -> (Self, watch::Receiver<AddressSet>) {
        let (tx, rx) = watch::channel(AddressSet::new());
        (Self { tx }, rx)
    }

    /// 再订阅一个 Receiver
    pub fn subscribe(&self) -> watch::Receiver<AddressSet> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl StateSink for WatchSink {
    async fn update_addresses(&self, addresses: &AddressSet) -> Result<()> {
        self.tx.send(addresses.clone()).map_err(|_| {
            DiscoveryError::new(ErrorCode::SinkUnavailable, "all address snapshot receivers dropped")
        })
    }
}

/// 对接 tonic 负载均衡 Channel 的接收端
///
/// tonic 的 `Channel::balance_channel` 接收增量的 `Change` 事件，
/// 这里把完整快照与上一次已应用的集合做差，转换成 Insert / Remove 事件。
/// 负载均衡算法本身由 tonic/tower 负责。
///
/// Channel 只在有请求时才消费事件，缓冲区满时推送会一直等待；
/// 此时关闭 Resolver 会中断推送，已发送的事件记录在 applied 中。
pub struct BalanceChannelSink {
    tx: mpsc::Sender<Change<NetworkAddress, Endpoint>>,
    applied: Mutex<AddressSet>,
    connect_timeout: Option<Duration>,
}

impl BalanceChannelSink {
    pub fn new(tx: mpsc::Sender<Change<NetworkAddress, Endpoint>>, connect_timeout: Option<Duration>) -> Self {
        Self {
            tx,
            applied: Mutex::new(AddressSet::new()),
            connect_timeout,
        }
    }

    /// 创建负载均衡 Channel 和对应的接收端
    ///
    /// 必须在 Tokio 运行时内调用。
    pub fn balance_channel(capacity: usize, connect_timeout: Option<Duration>) -> (Channel, Self) {
        let (channel, tx) = Channel::balance_channel(capacity);
        (channel, Self::new(tx, connect_timeout))
    }

    /// 当前已应用到 Channel 的地址集合
    pub async fn applied(&self) -> AddressSet {
        self.applied.lock().await.clone()
    }

    fn endpoint(&self, address: &NetworkAddress) -> Result<Endpoint> {
        let endpoint = Endpoint::from_shared(address.to_http_uri())
            .map_err(|e| DiscoveryError::new(ErrorCode::SinkUnavailable, format!("Invalid endpoint {}: {}", address, e)))?;
        Ok(match self.connect_timeout {
            Some(timeout) => endpoint.connect_timeout(timeout),
            None => endpoint,
        })
    }

    fn closed() -> DiscoveryError {
        DiscoveryError::new(ErrorCode::SinkUnavailable, "balance channel closed")
    }
}

#[async_trait]
impl StateSink for BalanceChannelSink {
    async fn update_addresses(&self, addresses: &AddressSet) -> Result<()> {
        let mut applied = self.applied.lock().await;

        let removed: Vec<NetworkAddress> = applied.difference(addresses).cloned().collect();
        let added: Vec<NetworkAddress> = addresses.difference(&applied).cloned().collect();

        // 每个事件发送成功后立即更新 applied，中途失败时下一次快照会从正确的位置重新做差
        for address in removed {
            self.tx
                .send(Change::Remove(address.clone()))
                .await
                .map_err(|_| Self::closed())?;
            applied.remove(&address);
        }

        for address in added {
            let endpoint = match self.endpoint(&address) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    warn!(address = %address, error = %e, "Skipping address that is not a valid endpoint");
                    continue;
                }
            };
            self.tx
                .send(Change::Insert(address.clone(), endpoint))
                .await
                .map_err(|_| Self::closed())?;
            applied.insert(address);
        }

        debug!(endpoints = applied.len(), "Balance channel endpoints synchronized");
        Ok(())
    }
}
