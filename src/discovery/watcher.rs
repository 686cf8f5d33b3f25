//! 长轮询监听循环
//!
//! 每个 Resolver 对应一个 Watcher，运行在独立的 Tokio 任务中：
//!
//! 1. 以 `last_index` 作为等待水位发起阻塞查询，注册中心在数据变化或等待超时后返回
//! 2. 成功：推进水位，把健康实例映射为地址，整体替换本地集合，推送完整快照
//! 3. 失败：记录日志，水位和地址集合保持不变，按指数退避（带抖动）等待后重试；成功后退避归零
//!
//! 取消信号在阻塞查询、快照推送和退避等待期间都会被观察到。
//! 推送只会因为关闭而中断，关闭之后不再有新的快照，运行期间消费方不会看到只应用了一半的快照。

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{HealthQuery, HealthResponse, RegistryClient};
use crate::config::WatchConfig;
use crate::discovery::instance::{AddressSet, CheckStatus, ServiceEntry};
use crate::discovery::sink::StateSink;
use crate::discovery::target::Target;
use crate::error::Result;
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};

/// 监听状态，只由所属的 Watcher 修改
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchState {
    last_index: u64,
    addresses: AddressSet,
}

impl WatchState {
    /// 最近一次成功轮询的水位
    pub fn last_index(&self) -> u64 {
        self.last_index
    }

    /// 最近一次成功轮询得到的地址集合
    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }
}

/// 服务监听器
pub struct Watcher {
    target: Target,
    client: Arc<dyn RegistryClient>,
    sink: Arc<dyn StateSink>,
    config: WatchConfig,
    retry: Arc<dyn RetryPolicy>,
    state: WatchState,
}

impl Watcher {
    pub fn new(
        target: Target,
        client: Arc<dyn RegistryClient>,
        sink: Arc<dyn StateSink>,
        config: WatchConfig,
    ) -> Self {
        let retry = Arc::new(ExponentialBackoffPolicy::from_config(&config));
        Self {
            target,
            client,
            sink,
            config,
            retry,
            state: WatchState::default(),
        }
    }

    /// 替换退避策略
    pub fn with_retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// 执行一次轮询：查询成功则应用并推送快照，失败则状态保持不变
    pub async fn poll_once(&mut self) -> Result<()> {
        let response = self.fetch().await?;
        self.apply(response);
        self.push().await;
        Ok(())
    }

    /// 运行监听循环直到取消，返回最终状态
    pub async fn run(mut self, cancel: CancellationToken) -> WatchState {
        info!(
            service = %self.target.service_name(),
            registry = %self.target.registry_address(),
            "👀 Watching service"
        );

        let mut failures: u32 = 0;
        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                fetched = self.fetch() => fetched,
            };

            match fetched {
                Ok(response) => {
                    failures = 0;
                    self.apply(response);

                    // 接收端可能长时间阻塞（如负载均衡 Channel 缓冲区已满），关闭时放弃本次推送
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = self.push() => {}
                    }
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = self.retry.backoff_duration(failures);
                    warn!(
                        service = %self.target.service_name(),
                        registry = %self.target.registry_address(),
                        error = %e,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        "⚠️ Failed to retrieve instances from registry, keeping last known addresses"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(
            service = %self.target.service_name(),
            index = self.state.last_index,
            instances = self.state.addresses.len(),
            "🛑 Watcher stopped"
        );
        self.state
    }

    fn query(&self) -> HealthQuery {
        let mut query = HealthQuery::new(self.target.service_name())
            .with_passing_only(self.config.passing_only)
            .with_wait_index(self.state.last_index);
        if self.config.filter_by_service_tag {
            query = query.with_tag(self.target.service_name());
        }
        query
    }

    async fn fetch(&self) -> Result<HealthResponse> {
        self.client.health_service(&self.query()).await
    }

    fn accepts(&self, entry: &ServiceEntry) -> bool {
        entry.is_healthy() || (!self.config.passing_only && entry.status == CheckStatus::Warning)
    }

    fn apply(&mut self, response: HealthResponse) {
        // 水位只进不退；注册中心索引回退（如快照恢复）时保留旧水位，仍然应用本次数据
        if response.index >= self.state.last_index {
            self.state.last_index = response.index;
        } else {
            warn!(
                service = %self.target.service_name(),
                current = self.state.last_index,
                received = response.index,
                "Registry index went backwards, keeping watermark"
            );
        }

        let addresses: AddressSet = response
            .entries
            .iter()
            .filter(|entry| self.accepts(entry))
            .filter_map(ServiceEntry::network_address)
            .collect();

        if addresses != self.state.addresses {
            info!(
                service = %self.target.service_name(),
                index = self.state.last_index,
                instances = addresses.len(),
                "🔄 Service addresses updated"
            );
        } else {
            debug!(
                service = %self.target.service_name(),
                index = self.state.last_index,
                "Service addresses unchanged"
            );
        }
        self.state.addresses = addresses;
    }

    async fn push(&self) {
        if let Err(e) = self.sink.update_addresses(&self.state.addresses).await {
            warn!(
                service = %self.target.service_name(),
                error = %e,
                "⚠️ Failed to push address snapshot"
            );
        }
    }
}
