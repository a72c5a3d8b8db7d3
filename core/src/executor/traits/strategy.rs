use std::time::Duration;

/// Error fragments that mark a failure as worth an immediate second attempt.
const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "econnreset",
    "connection reset",
    "econnrefused",
    "connection refused",
    "spawn",
    "enoent",
];

/// True when the error text looks like a timeout, a dropped connection, or a process that
/// could not be started at all. Matching is case-insensitive.
pub fn is_transient_error(error: &str) -> bool {
    let lower = error.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub trait RetryStrategyPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Delay before the attempt following `attempt` (1-based), or `None` to stop.
    fn next_delay(&self, attempt: u32, error: &str) -> Option<Duration>;

    fn max_attempts(&self) -> u32;

    fn should_retry(&self, attempt: u32, error: &str) -> bool {
        attempt < self.max_attempts() && self.is_retryable(error)
    }

    fn is_retryable(&self, error: &str) -> bool {
        is_transient_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Twice;

    impl RetryStrategyPlugin for Twice {
        fn name(&self) -> &str {
            "twice"
        }

        fn next_delay(&self, _attempt: u32, _error: &str) -> Option<Duration> {
            Some(Duration::ZERO)
        }

        fn max_attempts(&self) -> u32 {
            2
        }
    }

    #[test]
    fn classifies_transient_errors() {
        assert!(is_transient_error("read ECONNRESET"));
        assert!(is_transient_error("Timeout: task exceeded 5s"));
        assert!(is_transient_error("connect ECONNREFUSED 127.0.0.1:443"));
        assert!(is_transient_error("Failed to spawn process 'x': No such file"));
        assert!(!is_transient_error("invalid prompt"));
        assert!(!is_transient_error("Process exited with code 2"));
    }

    #[test]
    fn default_should_retry_caps_attempts() {
        let strategy = Twice;
        assert!(strategy.should_retry(1, "ECONNRESET"));
        assert!(!strategy.should_retry(2, "ECONNRESET"));
        assert!(!strategy.should_retry(1, "invalid prompt"));
    }
}
