//! 服务发现统一错误类型

use super::code::{ErrorCategory, ErrorCode};
use std::collections::HashMap;
use thiserror::Error;

/// 服务发现统一错误类型
///
/// 每个错误值都携带一个 [`ErrorCode`]，通过 [`ErrorCode::category`] 得到错误种类，
/// 调用方按种类分支即可，不需要对具体来源做类型判断。
#[derive(Error, Debug, Clone)]
#[error("[{code}] {reason}", code = .code.as_str())]
pub struct DiscoveryError {
    pub code: ErrorCode,
    pub reason: String,
    pub details: Option<String>,
    pub params: Option<HashMap<String, String>>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DiscoveryError {
    /// 创建错误
    pub fn new(code: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            details: None,
            params: None,
            timestamp: chrono::Utc::now(),
        }
    }

    // ============================================================
    // 便捷方法：目标地址
    // ============================================================

    pub fn missing_address() -> Self {
        Self::new(ErrorCode::MissingAddress, "consul resolver: missing address")
    }

    pub fn invalid_uri(target: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidUri, "consul resolver: invalid uri").with_param("target", target)
    }

    pub fn unsupported_scheme(scheme: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedScheme, "consul resolver: unsupported scheme")
            .with_param("scheme", scheme)
    }

    // ============================================================
    // 便捷方法：注册 / 轮询
    // ============================================================

    pub fn registration_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::RegistrationFailed, reason)
    }

    pub fn registration_rejected(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::RegistrationRejected, reason)
    }

    pub fn invalid_registration(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRegistration, reason)
    }

    pub fn poll_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::PollFailed, reason)
    }

    pub fn poll_rejected(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::PollRejected, reason)
    }

    // ============================================================
    // 便捷方法：系统
    // ============================================================

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, reason)
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, reason)
    }

    /// 添加错误详情
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// 添加单个参数
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// 获取错误代码
    #[inline]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// 获取错误种类
    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// 获取错误原因
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// 获取参数
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.as_ref()?.get(key).map(String::as_str)
    }

    /// 判断是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, DiscoveryError>;
