//! 服务发现模块
//!
//! 解析 `consul://host[:port]/service` 形式的目标地址，对注册中心做长轮询，
//! 把健康实例的地址集合以完整快照的形式推送给 [`StateSink`]。

pub mod connect;
pub mod instance;
pub mod plugin;
pub mod resolver;
pub mod sink;
pub mod target;
pub mod watcher;

pub use connect::connect_balanced;
pub use instance::{AddressSet, CheckStatus, NetworkAddress, ServiceEntry};
pub use plugin::{ResolverHandle, ResolverPlugin, SchemeRegistry};
pub use resolver::{DEFAULT_SCHEME, Resolver, ResolverBuilder, ResolverState};
pub use sink::{BalanceChannelSink, StateSink, WatchSink};
pub use target::Target;
pub use watcher::{WatchState, Watcher};
