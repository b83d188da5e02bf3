//! Vonage provider.
//!
//! Delivers verification codes through the Vonage SMS API (form-encoded
//! `POST /sms/json`) and the Vonage Voice API (`POST /v1/calls` with a
//! text-to-speech call-control action).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use verify_senders::vonage::{VonageConfig, VonageSender};
//! use verify_senders::{CountingMetrics, VerificationSender};
//! use std::sync::Arc;
//!
//! let config = VonageConfig::from_json_str(&std::fs::read_to_string("vonage.json")?)?;
//! let metrics = Arc::new(CountingMetrics::new());
//! let sender = VonageSender::builder(config).metrics(metrics.clone()).build()?;
//!
//! if !sender.deliver_sms(&"14155550123".into(), Some("android-ng"), &"123456".into()).await {
//!     sender.deliver_voice(&"14155550123".into(), &"123456".into(), Some("en-US")).await;
//! }
//! ```

mod config;
mod errors;
mod request;
mod response;
mod sender;

pub use config::{GatewayCredentials, VonageConfig};
pub use errors::{RequestError, VonageError};
pub use request::{
    CallEndpoint, CallRequest, DEFAULT_CALLER_ID, DEFAULT_SENDER_ID, NccoAction, SMS_PATH,
    VOICE_PATH, VonageRequestBuilder, sms_text, voice_text,
};
pub use response::{DeliveryResponse, JSON_CONTENT_TYPE};
pub use sender::{DEFAULT_SMS_BASE_URL, VonageSender, VonageSenderBuilder};
