//! # Verify Senders
//!
//! Fault-tolerant delivery of one-time verification codes over SMS and voice
//! gateways.
//!
//! Each gateway implements [`VerificationSender`]: one asynchronous operation
//! per channel, each resolving to `true` when the gateway accepted the
//! message and `false` otherwise. Errors never reach the caller; they are
//! logged and the delivery is reported as failed.
//!
//! ## Supported Gateways
//!
//! | Gateway | Feature | Website |
//! |---------|---------|---------|
//! | Vonage | `vonage` (default) | <https://www.vonage.com/communications-apis/> |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use verify_senders::vonage::{VonageConfig, VonageSender};
//! use verify_senders::VerificationSender;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VonageConfig::new(
//!         "api_key",
//!         "api_secret",
//!         vec!["14155550100".to_string()],
//!         "voice.example.com",
//!     );
//!     let sender = VonageSender::new(config)?;
//!
//!     let delivered = sender
//!         .deliver_sms(&"14155550123".into(), Some("ios"), &"123456".into())
//!         .await;
//!     println!("delivered: {delivered}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! VerificationSender        (trait: VonageSender, ...)
//!         │
//!         ├── RequestBuilder      (wire payloads per channel)
//!         ├── DeliveryResponse    (classify gateway replies)
//!         │
//!         ▼
//! FaultTolerantClient       (bulkhead → circuit breaker → retry)
//!         │
//!         ▼
//! reqwest-middleware
//! ```
//!
//! ## Features
//!
//! - `vonage` - Vonage gateway support (enabled by default)
//! - `tracing` - OpenTelemetry tracing instrumentation (enabled by default)
//! - `metrics` - OpenTelemetry delivery counters

pub mod errors;
pub mod metrics;
pub mod providers;
pub mod transport;
pub mod types;
pub mod utils;

#[cfg(feature = "vonage")]
pub use providers::vonage;

// Re-export commonly used types at the crate root
pub use errors::{ConfigError, RetryableError};
#[cfg(feature = "metrics")]
pub use metrics::OtelDeliveryMetrics;
pub use metrics::{CountingMetrics, DeliveryMetrics, NoopMetrics};
pub use providers::VerificationSender;
pub use types::{Channel, ClientType, Destination, VerificationCode, VerificationRequest};
pub use utils::retry::RetryConfig;
