//! Core types for verification delivery.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

// =============================================================================
// Destination
// =============================================================================

/// Phone number a verification code is delivered to (e.g., "14155550100").
///
/// No format validation is performed: malformed numbers are rejected by the
/// gateway, not locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination(String);

impl Destination {
    /// Create a new Destination.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Get the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Destination {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Destination {
    fn from(number: String) -> Self {
        Self(number)
    }
}

impl From<&str> for Destination {
    fn from(number: &str) -> Self {
        Self(number.to_string())
    }
}

// =============================================================================
// VerificationCode
// =============================================================================

/// One-time verification code sent to the end user.
///
/// `Debug` output is redacted so the code never ends up in logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Create a new VerificationCode.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationCode([REDACTED])")
    }
}

impl AsRef<str> for VerificationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for VerificationCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for VerificationCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

// =============================================================================
// Channel
// =============================================================================

/// Delivery mode for a verification code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Text message.
    Sms,
    /// Voice call reading the code aloud.
    Voice,
}

impl Channel {
    /// Short lowercase name, used as a metric attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Voice => "voice",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ClientType
// =============================================================================

/// Message template variant selected from a caller-supplied client hint.
///
/// Some client applications parse incoming verification messages and need
/// the text in a specific shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientType {
    /// iOS clients: the code is embedded a second time in a deep link.
    Ios,
    /// Next-generation Android clients: the text carries the app hash used
    /// for automatic SMS retrieval.
    AndroidNg,
    /// Any other client, or no hint at all.
    Generic,
}

impl ClientType {
    /// Select the template variant for an optional hint.
    ///
    /// Matching is exact: `"ios"` and `"android-ng"` are recognised, every
    /// other value falls back to [`ClientType::Generic`].
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some("ios") => Self::Ios,
            Some("android-ng") => Self::AndroidNg,
            _ => Self::Generic,
        }
    }
}

// =============================================================================
// VerificationRequest
// =============================================================================

/// A single verification delivery, created per call and consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    /// Phone number to deliver to.
    pub destination: Destination,
    /// The code to deliver.
    pub code: VerificationCode,
    /// SMS or voice.
    pub channel: Channel,
    /// Optional client-type hint selecting the SMS template.
    pub client_type_hint: Option<String>,
    /// Optional locale for the voice prompt (e.g., "en-US").
    pub locale: Option<String>,
}

impl VerificationRequest {
    /// Create an SMS delivery request.
    pub fn sms(destination: Destination, code: VerificationCode) -> Self {
        Self {
            destination,
            code,
            channel: Channel::Sms,
            client_type_hint: None,
            locale: None,
        }
    }

    /// Create a voice-call delivery request.
    pub fn voice(destination: Destination, code: VerificationCode) -> Self {
        Self {
            destination,
            code,
            channel: Channel::Voice,
            client_type_hint: None,
            locale: None,
        }
    }

    /// Set the client-type hint.
    pub fn with_client_type_hint(mut self, hint: Option<impl Into<String>>) -> Self {
        self.client_type_hint = hint.map(Into::into);
        self
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: Option<impl Into<String>>) -> Self {
        self.locale = locale.map(Into::into);
        self
    }

    /// Template variant for this request.
    pub fn client_type(&self) -> ClientType {
        ClientType::from_hint(self.client_type_hint.as_deref())
    }
}
