use std::time::Duration;

use subagent_core::api::{RetryConfig, RetryStrategyPlugin};

/// Constant pause between attempts; only transient failures qualify.
pub struct FixedDelayRetryPlugin {
    config: RetryConfig,
}

impl FixedDelayRetryPlugin {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryStrategyPlugin for FixedDelayRetryPlugin {
    fn name(&self) -> &str {
        "fixed-delay"
    }

    fn next_delay(&self, attempt: u32, _error: &str) -> Option<Duration> {
        if attempt >= self.max_attempts() {
            return None;
        }
        Some(Duration::from_millis(self.config.delay_ms))
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay() {
        let plugin = FixedDelayRetryPlugin::new(RetryConfig::default());
        assert_eq!(plugin.max_attempts(), 2);
        assert_eq!(plugin.next_delay(1, "timeout").unwrap().as_millis(), 2_000);
        assert_eq!(plugin.next_delay(2, "timeout"), None);
    }

    #[test]
    fn test_only_transient_errors_retry() {
        let plugin = FixedDelayRetryPlugin::new(RetryConfig {
            max_attempts: 2,
            delay_ms: 10,
        });
        assert!(plugin.should_retry(1, "Error: connect ECONNREFUSED 127.0.0.1:443"));
        assert!(plugin.should_retry(1, "Failed to spawn process 'claude': No such file"));
        assert!(!plugin.should_retry(1, "invalid prompt"));
        assert!(!plugin.should_retry(2, "timed out"));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let plugin = FixedDelayRetryPlugin::new(RetryConfig {
            max_attempts: 0,
            delay_ms: 10,
        });
        assert_eq!(plugin.max_attempts(), 1);
        assert!(!plugin.should_retry(1, "timeout"));
    }
}
