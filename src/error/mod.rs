//! 错误处理模块
//!
//! 提供统一的错误类型：每个错误都带有错误代码，错误代码归属于一个错误类别，
//! 目标解析、服务注册、轮询等不同阶段的错误按类别区分处理策略。

pub mod builder;
pub mod code;
pub mod conversions;
pub mod discovery_error;

pub use builder::ErrorBuilder;
pub use code::{ErrorCategory, ErrorCode};
pub use discovery_error::{DiscoveryError, Result};

/// 将基础设施错误（HTTP、序列化等）转换为 `DiscoveryError`
pub fn map_infra_error<E, S>(error: E, code: ErrorCode, message: S) -> DiscoveryError
where
    E: std::fmt::Display,
    S: Into<String>,
{
    ErrorBuilder::new(code, message.into())
        .details(error.to_string())
        .build()
}

/// 外部结果的辅助扩展，用于快速转换为统一的错误类型
pub trait InfraResultExt<T> {
    fn or_code<S>(self, code: ErrorCode, message: S) -> Result<T>
    where
        S: Into<String>;
}

impl<T, E> InfraResultExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn or_code<S>(self, code: ErrorCode, message: S) -> Result<T>
    where
        S: Into<String>,
    {
        self.map_err(|err| map_infra_error(err, code, message))
    }
}
