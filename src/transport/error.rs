//! Transport error types.

use crate::errors::{ConfigError, RetryableError};
use thiserror::Error;

/// Errors produced by a [`FaultTolerantClient`](super::FaultTolerantClient).
///
/// An HTTP response with any status code is not an error at this layer;
/// only failures that leave the caller without a response are.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Every worker is busy and the wait queue is full.
    #[error("{name}: work queue is full ({capacity} requests in flight or queued)")]
    QueueFull { name: String, capacity: usize },

    /// The circuit breaker is open; no network attempt was made.
    #[error("{name}: circuit breaker is open")]
    CircuitOpen { name: String },

    /// The worker pool was shut down while the request was queued.
    #[error("{name}: worker pool is closed")]
    PoolClosed { name: String },

    /// Failed to send HTTP request (connect, TLS, timeout).
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[source] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// The task executing the request panicked or was aborted.
    #[error("Request task did not complete: {0}")]
    Aborted(#[source] tokio::task::JoinError),

    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Invalid transport configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TransportError {
    /// True when the request was refused locally without touching the network.
    pub fn is_rejected_locally(&self) -> bool {
        matches!(
            self,
            TransportError::QueueFull { .. }
                | TransportError::CircuitOpen { .. }
                | TransportError::PoolClosed { .. }
        )
    }
}

impl RetryableError for TransportError {
    fn is_retryable(&self) -> bool {
        match self {
            // Network and read failures - the gateway may answer next time
            TransportError::HttpRequest(_) | TransportError::ReadBody(_) => true,
            // Local rejections and setup errors - retrying cannot help
            TransportError::QueueFull { .. }
            | TransportError::CircuitOpen { .. }
            | TransportError::PoolClosed { .. }
            | TransportError::Aborted(_)
            | TransportError::BuildHttpClient(_)
            | TransportError::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_rejections_are_not_retryable() {
        let full = TransportError::QueueFull {
            name: "gateway".into(),
            capacity: 110,
        };
        let open = TransportError::CircuitOpen {
            name: "gateway".into(),
        };
        assert!(!full.is_retryable());
        assert!(!open.is_retryable());
        assert!(full.is_rejected_locally());
        assert!(open.is_rejected_locally());
        assert_eq!(
            full.to_string(),
            "gateway: work queue is full (110 requests in flight or queued)"
        );
    }

    #[test]
    fn test_config_error_is_transparent() {
        let error = TransportError::from(ConfigError::Empty { field: "name" });
        assert!(!error.is_retryable());
        assert_eq!(
            error.to_string(),
            "configuration value `name` must not be empty"
        );
    }
}
