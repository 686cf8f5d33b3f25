//! 错误代码和错误类别定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
///
/// 错误代码按类别分组，每个类别占用1000个代码范围：
/// - 1000-1999: 目标地址格式错误（解析阶段，对 build 调用方是致命的）
/// - 2000-2999: 服务注册错误（由嵌入方决定是否致命）
/// - 3000-3999: 轮询错误（瞬时错误，由 Watcher 本地恢复，只记录日志）
/// - 4000-4999: Resolver 生命周期错误
/// - 6000-6999: 系统相关错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 目标地址错误 (1000-1999)
    // ============================================================
    MissingAddress = 1000,
    InvalidUri = 1001,
    UnsupportedScheme = 1002,

    // ============================================================
    // 注册错误 (2000-2999)
    // ============================================================
    RegistrationFailed = 2000,
    RegistrationRejected = 2001,
    InvalidRegistration = 2002,

    // ============================================================
    // 轮询错误 (3000-3999)
    // ============================================================
    PollFailed = 3000,
    PollRejected = 3001,
    PollDecodeFailed = 3002,

    // ============================================================
    // Resolver 错误 (4000-4999)
    // ============================================================
    ResolverClosed = 4000,
    SinkUnavailable = 4001,

    // ============================================================
    // 系统相关错误 (6000-6999)
    // ============================================================
    InternalError = 6000,
    ConfigurationError = 6001,
    ClientBuildFailed = 6002,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingAddress => "MISSING_ADDRESS",
            ErrorCode::InvalidUri => "INVALID_URI",
            ErrorCode::UnsupportedScheme => "UNSUPPORTED_SCHEME",
            ErrorCode::RegistrationFailed => "REGISTRATION_FAILED",
            ErrorCode::RegistrationRejected => "REGISTRATION_REJECTED",
            ErrorCode::InvalidRegistration => "INVALID_REGISTRATION",
            ErrorCode::PollFailed => "POLL_FAILED",
            ErrorCode::PollRejected => "POLL_REJECTED",
            ErrorCode::PollDecodeFailed => "POLL_DECODE_FAILED",
            ErrorCode::ResolverClosed => "RESOLVER_CLOSED",
            ErrorCode::SinkUnavailable => "SINK_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::ClientBuildFailed => "CLIENT_BUILD_FAILED",
        }
    }

    /// 获取错误代码的类别（即错误种类标签）
    pub fn category(&self) -> ErrorCategory {
        match self.as_u32() {
            1000..=1999 => ErrorCategory::InvalidTargetFormat,
            2000..=2999 => ErrorCategory::Registration,
            3000..=3999 => ErrorCategory::Poll,
            4000..=4999 => ErrorCategory::Resolver,
            _ => ErrorCategory::System,
        }
    }

    /// 判断是否为可重试的错误
    ///
    /// 轮询错误在 Watcher 内部无限重试（带退避）；注册传输失败也可以由调用方重试，
    /// 但被注册中心拒绝的请求重试无意义。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::PollFailed
                | ErrorCode::PollRejected
                | ErrorCode::PollDecodeFailed
                | ErrorCode::RegistrationFailed
        )
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    InvalidTargetFormat,
    Registration,
    Poll,
    Resolver,
    System,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::InvalidTargetFormat => write!(f, "INVALID_TARGET_FORMAT"),
            ErrorCategory::Registration => write!(f, "REGISTRATION"),
            ErrorCategory::Poll => write!(f, "POLL"),
            ErrorCategory::Resolver => write!(f, "RESOLVER"),
            ErrorCategory::System => write!(f, "SYSTEM"),
        }
    }
}
