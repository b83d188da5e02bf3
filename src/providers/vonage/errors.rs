//! Error types for the Vonage provider.

use crate::errors::ConfigError;
use crate::transport::TransportError;
use thiserror::Error;

/// Errors raised while constructing a [`VonageSender`](super::VonageSender).
///
/// Delivery itself never returns an error; see
/// [`VerificationSender`](crate::VerificationSender).
#[derive(Debug, Error)]
pub enum VonageError {
    /// Invalid or missing configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An endpoint URL could not be parsed.
    #[error("Invalid {channel} endpoint `{url}`: {source}")]
    InvalidEndpoint {
        channel: &'static str,
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The transport could not be built.
    #[error("Failed to build gateway transport: {0}")]
    Transport(#[from] TransportError),
}

/// Errors raised while encoding a single gateway request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Error encoding the SMS form body.
    #[error("Error encoding SMS form body: {0}")]
    EncodeForm(#[source] serde_urlencoded::ser::Error),

    /// Error encoding the voice-call JSON body.
    #[error("Error encoding voice call body: {0}")]
    EncodeJson(#[source] serde_json::Error),

    /// Credentials cannot be carried in an HTTP header.
    #[error("Invalid authorization header: {0}")]
    InvalidHeader(#[source] reqwest::header::InvalidHeaderValue),
}
