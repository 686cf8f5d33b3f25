use super::RetryPolicy;
use rand::Rng;
use std::time::Duration;

use crate::config::WatchConfig;

/// 指数退避重试策略（带抖动）
///
/// 第 n 次连续失败的基础延迟为 `base * 2^(n-1)`，不超过 `max_delay`；
/// 开启抖动时实际延迟在 `[delay/2, delay]` 之间均匀分布，避免多个 Watcher 同时重试。
pub struct ExponentialBackoffPolicy {
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl ExponentialBackoffPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            jitter: true,
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(config.backoff_base(), config.backoff_max())
    }

    /// 关闭抖动（延迟完全确定）
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    fn capped_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl RetryPolicy for ExponentialBackoffPolicy {
    fn backoff_duration(&self, attempt: u32) -> Duration {
        let delay = self.capped_delay(attempt);
        if !self.jitter {
            return delay;
        }

        let delay_ms = delay.as_millis() as u64;
        let half = delay_ms / 2;
        if half == 0 {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(0..=delay_ms - half);
        Duration::from_millis(half + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_capped() {
        let policy = ExponentialBackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(1))
            .without_jitter();
        assert_eq!(policy.backoff_duration(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_duration(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_duration(4), Duration::from_millis(800));
        assert_eq!(policy.backoff_duration(5), Duration::from_secs(1));
        assert_eq!(policy.backoff_duration(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = ExponentialBackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(2));
        for attempt in 1..=10 {
            let ceiling = policy.capped_delay(attempt);
            let delay = policy.backoff_duration(attempt);
            assert!(delay <= ceiling, "attempt {attempt}: {delay:?} > {ceiling:?}");
            assert!(delay >= ceiling / 2, "attempt {attempt}: {delay:?} < half of {ceiling:?}");
        }
    }
}
