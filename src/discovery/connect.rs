//! 负载均衡 Channel 快捷入口
//!
//! 把 Resolver 和 [`BalanceChannelSink`] 组装在一起，调用方直接拿到可用的 tonic Channel。

use std::sync::Arc;
use std::time::Duration;
use tonic::transport::Channel;

use crate::discovery::resolver::{Resolver, ResolverBuilder};
use crate::discovery::sink::BalanceChannelSink;
use crate::error::{DiscoveryError, Result};

/// 负载均衡 Channel 的 Change 缓冲容量
pub const DEFAULT_BALANCE_CAPACITY: usize = 64;

/// 建立一个按目标服务动态负载均衡的 gRPC Channel
///
/// 返回的 Resolver 必须与 Channel 一起持有；Resolver 被丢弃后地址集合不再更新。
pub fn connect_balanced(
    builder: &ResolverBuilder,
    target: &str,
    connect_timeout: Duration,
) -> Result<(Channel, Resolver)> {
    tokio::runtime::Handle::try_current().map_err(|e| {
        DiscoveryError::internal("balanced channel must be created inside a Tokio runtime")
            .with_details(e.to_string())
    })?;

    // 先解析目标，格式错误时不创建 Channel
    builder.parse_target(target)?;

    let (channel, sink) = BalanceChannelSink::balance_channel(DEFAULT_BALANCE_CAPACITY, Some(connect_timeout));
    let resolver = builder.build(target, Arc::new(sink))?;
    Ok((channel, resolver))
}
