//! Error types and traits shared by the fallible layers of the crate.

use thiserror::Error;

/// Trait for errors that can be classified as transient or permanent.
///
/// The transport consults this before scheduling another attempt: only
/// transient failures (connection refused, timeouts, truncated bodies) are
/// retried. Local rejections such as a full work queue or an open circuit
/// breaker are permanent for the current call.
///
/// # Examples
///
/// ```rust
/// use verify_senders::RetryableError;
///
/// enum MyError {
///     ConnectionReset,  // Try again
///     QueueFull,        // Fail fast
/// }
///
/// impl RetryableError for MyError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, MyError::ConnectionReset)
///     }
/// }
///
/// assert!(MyError::ConnectionReset.is_retryable());
/// assert!(!MyError::QueueFull.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error represents a transient failure
    /// that might succeed if the same request is sent again.
    fn is_retryable(&self) -> bool;
}

/// Invalid or missing configuration.
///
/// Raised while constructing senders and transports, never per call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A required value is missing or blank.
    #[error("configuration value `{field}` must not be empty")]
    Empty { field: &'static str },

    /// A value is present but outside its allowed range.
    #[error("configuration value `{field}` is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// The configuration document could not be decoded.
    #[error("malformed configuration: {0}")]
    Malformed(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
