//! 重试退避策略模块

pub mod exponential;
pub mod fixed;

pub use exponential::ExponentialBackoffPolicy;
pub use fixed::FixedRetryPolicy;

use std::time::Duration;

/// 重试退避策略 trait
///
/// `attempt` 为连续失败次数，从 1 开始；调用方在成功后自行把计数归零。
pub trait RetryPolicy: Send + Sync {
    fn backoff_duration(&self, attempt: u32) -> Duration;
}
