//! Circuit breaker configuration.

use std::time::Duration;

/// Configuration for a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures that trips the circuit open.
    ///
    /// A threshold of zero behaves like one: the first failure trips.
    pub failure_threshold: u32,

    /// Maximum number of in-flight probe calls while half-open.
    ///
    /// Also the number of consecutive probe successes required to close the
    /// circuit again. Zero behaves like one.
    pub max_requests: u32,

    /// Rolling period after which the closed-state counters are cleared.
    ///
    /// [`Duration::ZERO`] disables the rolling reset; counters then only
    /// clear on state transitions.
    pub interval: Duration,

    /// How long the circuit stays open before probing (the cool-down).
    ///
    /// [`Duration::ZERO`] falls back to the default of 60 seconds.
    pub open_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            max_requests: 1,
            interval: Duration::ZERO,
            open_duration: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failure threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the half-open probe cap.
    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Sets the rolling counter-reset interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the open-state cool-down duration.
    pub fn with_open_duration(mut self, duration: Duration) -> Self {
        self.open_duration = duration;
        self
    }

    pub(crate) fn effective_max_requests(&self) -> u32 {
        self.max_requests.max(1)
    }

    pub(crate) fn effective_open_duration(&self) -> Duration {
        if self.open_duration.is_zero() {
            Duration::from_secs(60)
        } else {
            self.open_duration
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.max_requests, 1);
        assert_eq!(config.interval, Duration::ZERO);
        assert_eq!(config.open_duration, Duration::from_secs(60));
    }

    #[test]
    fn test_config_builder() {
        let config = CircuitBreakerConfig::new()
            .with_failure_threshold(3)
            .with_max_requests(2)
            .with_interval(Duration::from_secs(10))
            .with_open_duration(Duration::from_millis(500));

        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.max_requests, 2);
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.open_duration, Duration::from_millis(500));
    }

    #[test]
    fn test_zero_values_normalize() {
        let config = CircuitBreakerConfig::new()
            .with_max_requests(0)
            .with_open_duration(Duration::ZERO);

        assert_eq!(config.effective_max_requests(), 1);
        assert_eq!(config.effective_open_duration(), Duration::from_secs(60));
    }
}
