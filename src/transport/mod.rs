//! Fault-tolerant HTTP transport.
//!
//! A [`FaultTolerantClient`] wraps one HTTP client in three layers, applied
//! in this order to every request:
//!
//! ```text
//! Bulkhead        (bounded workers + bounded queue, fail fast when full)
//!     │
//!     ▼
//! CircuitBreaker  (reject immediately while the dependency is failing)
//!     │
//!     ▼
//! Retry           (exponential backoff on transient transport errors)
//!     │
//!     ▼
//! reqwest-middleware client
//! ```
//!
//! The transport knows nothing about any particular gateway; each external
//! dependency gets its own instance and therefore its own failure domain.

pub(crate) mod bulkhead;
pub(crate) mod circuit_breaker;
pub(crate) mod client;
pub(crate) mod config;
pub(crate) mod error;

pub use bulkhead::{Bulkhead, BulkheadSlot};
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use client::{FaultTolerantClient, GatewayRequest, GatewayResponse, OnRetryCallback};
pub use config::{BulkheadConfig, CircuitBreakerConfig, DEFAULT_CONNECT_TIMEOUT, TransportConfig};
pub use error::TransportError;
