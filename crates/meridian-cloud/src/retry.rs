//! Transport-level retry configuration
//!
//! Retry here covers transient transport failures only (connection errors,
//! 5xx, 429). It runs entirely inside the client, below any higher-level
//! polling, so convergence timeouts in consumers stay unambiguous.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Whether retry is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of retry attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Maximum backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            backoff_ms: 100,
            max_backoff_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Returns the delay before the given retry attempt, or `None` if
    /// retries are exhausted.
    ///
    /// `attempt` is 1-indexed, so 1 is the first retry. The delay doubles
    /// per attempt and is capped at `max_backoff_ms`.
    pub(crate) fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled || attempt > self.max_attempts {
            return None;
        }
        let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay_ms = self
            .backoff_ms
            .saturating_mul(multiplier)
            .min(self.max_backoff_ms);
        Some(Duration::from_millis(delay_ms))
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_delays() {
        let retry = RetryConfig::default();

        assert_eq!(retry.delay_for_attempt(1), Some(Duration::from_millis(100)));
        assert_eq!(retry.delay_for_attempt(2), Some(Duration::from_millis(200)));
        assert_eq!(retry.delay_for_attempt(3), Some(Duration::from_millis(400)));
        assert_eq!(retry.delay_for_attempt(4), None);
    }

    #[test]
    fn test_delay_is_capped() {
        let retry = RetryConfig {
            enabled: true,
            max_attempts: 10,
            backoff_ms: 1000,
            max_backoff_ms: 3000,
        };

        assert_eq!(retry.delay_for_attempt(5), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_disabled_never_delays() {
        let retry = RetryConfig::disabled();
        assert_eq!(retry.delay_for_attempt(1), None);
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let retry: RetryConfig = serde_json::from_str("{}").unwrap();
        assert!(retry.enabled);
        assert_eq!(retry.max_attempts, 3);
    }
}
