//! Transport configuration types.

use crate::errors::ConfigError;
use crate::utils::duration_ms;
use crate::utils::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default connect timeout for gateway connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Circuit breaker settings.
///
/// The breaker keeps a ring of the most recent call outcomes and opens once
/// the ring is full and the share of failures reaches
/// `failure_rate_threshold` percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircuitBreakerConfig {
    /// Failure rate, in percent, at which the breaker opens (default: 50).
    pub failure_rate_threshold: f32,
    /// Number of outcomes evaluated while closed (default: 100).
    pub ring_buffer_size_in_closed_state: usize,
    /// Number of trial calls admitted while half-open (default: 10).
    pub ring_buffer_size_in_half_open_state: usize,
    /// How long the breaker stays open before admitting trial calls (default: 10 seconds).
    #[serde(rename = "waitDurationInOpenStateMs", with = "duration_ms")]
    pub wait_duration_in_open_state: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            ring_buffer_size_in_closed_state: 100,
            ring_buffer_size_in_half_open_state: 10,
            wait_duration_in_open_state: Duration::from_secs(10),
        }
    }
}

impl CircuitBreakerConfig {
    /// Set the failure rate threshold in percent.
    pub fn with_failure_rate_threshold(mut self, percent: f32) -> Self {
        self.failure_rate_threshold = percent;
        self
    }

    /// Set the ring size evaluated while closed.
    pub fn with_ring_buffer_size_in_closed_state(mut self, size: usize) -> Self {
        self.ring_buffer_size_in_closed_state = size;
        self
    }

    /// Set the number of trial calls admitted while half-open.
    pub fn with_ring_buffer_size_in_half_open_state(mut self, size: usize) -> Self {
        self.ring_buffer_size_in_half_open_state = size;
        self
    }

    /// Set how long the breaker stays open.
    pub fn with_wait_duration_in_open_state(mut self, wait: Duration) -> Self {
        self.wait_duration_in_open_state = wait;
        self
    }

    /// Check that every setting is within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 100.0) {
            return Err(ConfigError::invalid(
                "circuitBreaker.failureRateThreshold",
                format!("{} is not in (0, 100]", self.failure_rate_threshold),
            ));
        }
        if self.ring_buffer_size_in_closed_state == 0 {
            return Err(ConfigError::invalid(
                "circuitBreaker.ringBufferSizeInClosedState",
                "must be at least 1",
            ));
        }
        if self.ring_buffer_size_in_half_open_state == 0 {
            return Err(ConfigError::invalid(
                "circuitBreaker.ringBufferSizeInHalfOpenState",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Bounds of the worker pool dedicated to one external dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkheadConfig {
    /// Requests executing concurrently (default: 10).
    pub workers: usize,
    /// Requests allowed to wait for a worker (default: 100).
    pub queue_depth: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            queue_depth: 100,
        }
    }
}

impl BulkheadConfig {
    /// Create a new bulkhead configuration.
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        Self {
            workers,
            queue_depth,
        }
    }

    /// Requests admitted at once: executing plus waiting.
    pub fn capacity(&self) -> usize {
        self.workers + self.queue_depth
    }
}

/// Everything a [`FaultTolerantClient`](super::FaultTolerantClient) needs, passed once at construction.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Name of the dependency, used in logs and errors.
    pub name: String,
    /// Circuit breaker policy.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
    /// TCP/TLS connect timeout (default: 10 seconds).
    pub connect_timeout: Duration,
    /// Whole-request timeout, unlimited when `None`.
    pub request_timeout: Option<Duration>,
    /// Worker pool bounds.
    pub bulkhead: BulkheadConfig,
}

impl TransportConfig {
    /// Create a configuration with default policies.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
            bulkhead: BulkheadConfig::default(),
        }
    }

    /// Set the circuit breaker policy.
    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the whole-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the worker pool bounds.
    pub fn with_bulkhead(mut self, bulkhead: BulkheadConfig) -> Self {
        self.bulkhead = bulkhead;
        self
    }

    /// Check that every setting is within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Empty { field: "name" });
        }
        self.circuit_breaker.validate()?;
        if !(self.retry.factor >= 1.0) {
            return Err(ConfigError::invalid(
                "retry.factor",
                format!("{} is less than 1", self.retry.factor),
            ));
        }
        if self.retry.min_delay > self.retry.max_delay {
            return Err(ConfigError::invalid(
                "retry.minDelayMs",
                "must not exceed retry.maxDelayMs",
            ));
        }
        if self.bulkhead.workers == 0 {
            return Err(ConfigError::invalid("bulkhead.workers", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_config_defaults() {
        let config = TransportConfig::new("gateway");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.bulkhead, BulkheadConfig::new(10, 100));
        assert_eq!(config.bulkhead.capacity(), 110);
        assert!(config.request_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_circuit_breaker_config_deserialize() {
        let config: CircuitBreakerConfig = serde_json::from_str(
            r#"{"failureRateThreshold": 25, "waitDurationInOpenStateMs": 1500}"#,
        )
        .unwrap();
        assert_eq!(config.failure_rate_threshold, 25.0);
        assert_eq!(config.wait_duration_in_open_state, Duration::from_millis(1500));
        assert_eq!(config.ring_buffer_size_in_closed_state, 100);
    }

    #[test]
    fn test_circuit_breaker_config_rejects_bad_threshold() {
        let config = CircuitBreakerConfig::default().with_failure_rate_threshold(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "circuitBreaker.failureRateThreshold"
        ));

        let config = CircuitBreakerConfig::default().with_failure_rate_threshold(150.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transport_config_rejects_zero_workers() {
        let config = TransportConfig::new("gateway").with_bulkhead(BulkheadConfig::new(0, 5));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transport_config_rejects_shrinking_backoff() {
        let config = TransportConfig::new("gateway")
            .with_retry(RetryConfig::default().with_factor(0.5));
        assert!(config.validate().is_err());
    }
}
