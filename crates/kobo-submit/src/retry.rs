//! Retry policy for submission requests.
//!
//! Transient server errors and transport failures are retried with
//! exponential backoff. When retries run out, the last response or error is
//! handed back unchanged.

use std::time::Duration;

/// Statuses treated as transient.
pub const DEFAULT_STATUS_FORCELIST: [u16; 4] = [500, 502, 503, 504];

/// How many times, and how patiently, a request is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds.
    pub backoff_factor: f64,
    pub max_backoff: Duration,
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 0.1,
            max_backoff: Duration::from_secs(120),
            status_forcelist: DEFAULT_STATUS_FORCELIST.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor.max(0.0);
        self
    }

    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Delay before retry number `retry` (1-based).
    ///
    /// The first retry is immediate; later ones wait
    /// `backoff_factor * 2^(retry - 1)` seconds, capped at `max_backoff`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if retry <= 1 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let secs = self.backoff_factor * 2f64.powi(exponent);
        if !secs.is_finite() || secs >= self.max_backoff.as_secs_f64() {
            return self.max_backoff;
        }
        Duration::from_secs_f64(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_retries_five_times_on_server_errors() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 6);
        for status in [500, 502, 503, 504] {
            assert!(policy.is_retryable_status(status));
        }
        for status in [200, 201, 400, 401, 404, 429, 501] {
            assert!(!policy.is_retryable_status(status));
        }
    }

    #[test]
    fn backoff_doubles_after_the_first_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::ZERO);
        assert_eq!(policy.backoff_for(2), Duration::from_secs_f64(0.2));
        assert_eq!(policy.backoff_for(3), Duration::from_secs_f64(0.4));
        assert_eq!(policy.backoff_for(5), Duration::from_secs_f64(1.6));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(40), Duration::from_secs(120));
        assert_eq!(policy.backoff_for(u32::MAX), Duration::from_secs(120));
    }

    #[test]
    fn zero_factor_never_sleeps() {
        let policy = RetryPolicy::default().with_backoff_factor(0.0);
        assert_eq!(policy.backoff_for(4), Duration::ZERO);
    }
}
