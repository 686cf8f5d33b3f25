//! 错误类型转换实现
//!
//! 注册与轮询共用同一个 HTTP 客户端，reqwest 错误的归类取决于调用场景，
//! 因此不提供 `From<reqwest::Error>`，由调用处通过 `map_infra_error` 指定错误代码。

use super::{DiscoveryError, ErrorCode, map_infra_error};
use std::io;

impl From<io::Error> for DiscoveryError {
    fn from(err: io::Error) -> Self {
        map_infra_error(err, ErrorCode::InternalError, "IO 错误")
    }
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(err: serde_json::Error) -> Self {
        map_infra_error(err, ErrorCode::PollDecodeFailed, "JSON 解析错误")
    }
}

impl From<toml::de::Error> for DiscoveryError {
    fn from(err: toml::de::Error) -> Self {
        map_infra_error(err, ErrorCode::ConfigurationError, "配置文件解析错误")
    }
}
