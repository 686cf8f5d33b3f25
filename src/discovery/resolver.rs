//! Resolver：目标地址解析 + 后台监听任务的生命周期
//!
//! 状态只会向前推进：`Building -> Watching -> Closed`。

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{ClientBuilder, RegistryClient};
use crate::config::{ClientOptions, Config, WatchConfig};
use crate::discovery::sink::StateSink;
use crate::discovery::target::{self, Target};
use crate::discovery::watcher::{WatchState, Watcher};
use crate::error::{DiscoveryError, ErrorCode, Result};
use crate::retry::RetryPolicy;

/// 默认 scheme
pub const DEFAULT_SCHEME: &str = "consul";

/// Resolver 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResolverState {
    Building = 0,
    Watching = 1,
    Closed = 2,
}

impl ResolverState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ResolverState::Building,
            1 => ResolverState::Watching,
            _ => ResolverState::Closed,
        }
    }
}

/// Resolver 构建器
///
/// 持有 scheme、客户端选项和监听配置；同一个构建器可以为多个目标构建 Resolver。
#[derive(Clone)]
pub struct ResolverBuilder {
    scheme: String,
    options: ClientOptions,
    watch: WatchConfig,
    retry: Option<Arc<dyn RetryPolicy>>,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            options: ClientOptions::default(),
            watch: WatchConfig::default(),
            retry: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_options(config.client.clone())
            .with_watch_config(config.watch.clone())
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_watch_config(mut self, watch: WatchConfig) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// 解析目标地址（可带 `scheme://` 前缀）
    pub fn parse_target(&self, raw: &str) -> Result<Target> {
        target::parse(target::strip_scheme(raw, &self.scheme)?)
    }

    /// 解析目标、创建注册中心客户端并启动监听任务
    ///
    /// 必须在 Tokio 运行时内调用。目标格式错误时不会创建任何后台任务。
    pub fn build(&self, raw_target: &str, sink: Arc<dyn StateSink>) -> Result<Resolver> {
        let target = self.parse_target(raw_target)?;
        let client = ClientBuilder::new(target.registry_address())
            .options(self.options.clone())
            .request_timeout(self.watch.request_timeout())
            .build()?;
        self.build_with_client(target, Arc::new(client), sink)
    }

    /// 使用给定的注册中心客户端启动监听任务
    pub fn build_with_client(
        &self,
        target: Target,
        client: Arc<dyn RegistryClient>,
        sink: Arc<dyn StateSink>,
    ) -> Result<Resolver> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            DiscoveryError::internal("resolver must be built inside a Tokio runtime").with_details(e.to_string())
        })?;

        let mut resolver = Resolver::building(target.clone());

        let mut watcher = Watcher::new(target, client, sink, self.watch.clone());
        if let Some(retry) = &self.retry {
            watcher = watcher.with_retry_policy(retry.clone());
        }

        resolver.task = Some(handle.spawn(watcher.run(resolver.cancel.clone())));
        resolver.advance(ResolverState::Building, ResolverState::Watching);

        info!(
            service = %resolver.target.service_name(),
            registry = %resolver.target.registry_address(),
            "✅ Resolver started"
        );
        Ok(resolver)
    }
}

/// 一个目标的解析器
///
/// 丢弃时自动关闭；需要拿到监听任务最终状态时使用 [`Resolver::shutdown`]。
pub struct Resolver {
    target: Target,
    state: AtomicU8,
    cancel: CancellationToken,
    task: Option<JoinHandle<WatchState>>,
}

impl Resolver {
    fn building(target: Target) -> Self {
        Self {
            target,
            state: AtomicU8::new(ResolverState::Building as u8),
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    fn advance(&self, from: ResolverState, to: ResolverState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn state(&self) -> ResolverState {
        ResolverState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// 立即解析提示
    ///
    /// 监听循环自行驱动，这里不做任何事。
    pub fn resolve_now(&self) {
        debug!(service = %self.target.service_name(), "resolve_now ignored, watch loop is self-driving");
    }

    /// 关闭 Resolver，通知监听任务停止；重复调用无副作用
    pub fn close(&self) {
        let previous = self.state.swap(ResolverState::Closed as u8, Ordering::AcqRel);
        if ResolverState::from_u8(previous) == ResolverState::Closed {
            return;
        }
        self.cancel.cancel();
        info!(service = %self.target.service_name(), "Resolver closed");
    }

    /// 关闭并等待监听任务退出，返回其最终状态
    pub async fn shutdown(mut self) -> Result<WatchState> {
        self.close();
        let task = self
            .task
            .take()
            .ok_or_else(|| DiscoveryError::new(ErrorCode::ResolverClosed, "watch task already finished"))?;
        task.await
            .map_err(|e| DiscoveryError::internal("watch task failed").with_details(e.to_string()))
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        self.close();
    }
}
