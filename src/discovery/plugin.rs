//! 按 scheme 注册的 Resolver 插件
//!
//! RPC 框架侧只依赖 [`ResolverPlugin`] / [`ResolverHandle`] 两个 trait，
//! 具体实现（目前只有 consul）通过 [`SchemeRegistry`] 按 scheme 查找。

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::discovery::resolver::{Resolver, ResolverBuilder, ResolverState};
use crate::discovery::sink::StateSink;
use crate::error::{DiscoveryError, Result};

/// 已构建的 Resolver 句柄
pub trait ResolverHandle: Send + Sync {
    fn resolve_now(&self);
    fn close(&self);
    fn state(&self) -> ResolverState;
}

/// Resolver 插件
pub trait ResolverPlugin: Send + Sync {
    /// 插件处理的 scheme（不含 `://`）
    fn scheme(&self) -> &str;

    fn build(&self, target: &str, sink: Arc<dyn StateSink>) -> Result<Box<dyn ResolverHandle>>;
}

impl ResolverHandle for Resolver {
    fn resolve_now(&self) {
        Resolver::resolve_now(self)
    }

    fn close(&self) {
        Resolver::close(self)
    }

    fn state(&self) -> ResolverState {
        Resolver::state(self)
    }
}

impl ResolverPlugin for ResolverBuilder {
    fn scheme(&self) -> &str {
        ResolverBuilder::scheme(self)
    }

    fn build(&self, target: &str, sink: Arc<dyn StateSink>) -> Result<Box<dyn ResolverHandle>> {
        let resolver = ResolverBuilder::build(self, target, sink)?;
        Ok(Box::new(resolver))
    }
}

/// scheme -> 插件 的注册表
#[derive(Default)]
pub struct SchemeRegistry {
    plugins: HashMap<String, Arc<dyn ResolverPlugin>>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册插件，返回同 scheme 下被替换的旧插件
    pub fn register(&mut self, plugin: Arc<dyn ResolverPlugin>) -> Option<Arc<dyn ResolverPlugin>> {
        let scheme = plugin.scheme().to_ascii_lowercase();
        info!(scheme = %scheme, "Registering resolver plugin");
        self.plugins.insert(scheme, plugin)
    }

    pub fn get(&self, scheme: &str) -> Option<Arc<dyn ResolverPlugin>> {
        self.plugins.get(&scheme.to_ascii_lowercase()).cloned()
    }

    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.plugins.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// 按 URI 的 scheme 选择插件并构建 Resolver
    pub fn build(&self, uri: &str, sink: Arc<dyn StateSink>) -> Result<Box<dyn ResolverHandle>> {
        let (scheme, _) = uri
            .split_once("://")
            .ok_or_else(|| DiscoveryError::invalid_uri(uri))?;
        let plugin = self
            .get(scheme)
            .ok_or_else(|| DiscoveryError::unsupported_scheme(scheme))?;
        plugin.build(uri, sink)
    }
}
