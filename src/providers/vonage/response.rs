//! Response model and classification for the Vonage gateway.

use crate::metrics::price_to_subunits;
use crate::transport::GatewayResponse;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};

#[cfg(feature = "tracing")]
use tracing::warn;

/// Media type the gateway uses for structured bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Outcome reported by the gateway for one delivery.
///
/// Exactly one shape applies to every response; the status code decides
/// between success and failure, the content type decides whether the body
/// is decoded at all.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryResponse {
    /// Gateway accepted the message. `price` is 0 when not reported.
    Success { price: f64 },
    /// Gateway rejected the message with a machine-readable reason.
    Failure { status: i64, message: String },
    /// Body was not JSON; only the HTTP status is known.
    Unparseable { status: StatusCode },
}

impl DeliveryResponse {
    /// Classify a raw response.
    ///
    /// - 2xx with a JSON content type decodes `price`; a malformed body still
    ///   counts as success with price 0, since the gateway accepted the request.
    /// - other statuses with a JSON content type decode `status` and `message`;
    ///   a malformed body yields a failure with status 0 and an empty message.
    /// - any other content type is [`DeliveryResponse::Unparseable`].
    pub fn classify(status: StatusCode, content_type: Option<&str>, body: &str) -> Self {
        if !is_json(content_type) {
            return Self::Unparseable { status };
        }

        if status.is_success() {
            let parsed = serde_json::from_str::<SuccessBody>(body).unwrap_or_else(|_e| {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "Error parsing Vonage success response");
                SuccessBody::default()
            });
            Self::Success {
                price: parsed.price,
            }
        } else {
            let parsed = serde_json::from_str::<FailureBody>(body).unwrap_or_else(|_e| {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, http_status = %status, "Error parsing Vonage failure response");
                FailureBody::default()
            });
            Self::Failure {
                status: parsed.status,
                message: parsed.message,
            }
        }
    }

    /// Classify a response returned by the transport.
    pub fn from_gateway(response: &GatewayResponse) -> Self {
        Self::classify(
            response.status,
            response.content_type.as_deref(),
            &response.body,
        )
    }

    /// Whether the message counts as delivered.
    ///
    /// Unparseable bodies are judged by their HTTP status alone.
    pub fn is_delivered(&self) -> bool {
        match self {
            Self::Success { .. } => true,
            Self::Failure { .. } => false,
            Self::Unparseable { status } => status.is_success(),
        }
    }

    /// Reported price in thousandths, 0 for anything but a success.
    pub fn price_subunits(&self) -> u64 {
        match self {
            Self::Success { price } => price_to_subunits(*price),
            Self::Failure { .. } | Self::Unparseable { .. } => 0,
        }
    }
}

/// Compare only the media type, ignoring parameters such as `charset`.
fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
}

#[derive(Debug, Default, Deserialize)]
struct SuccessBody {
    #[serde(default, deserialize_with = "lenient_f64")]
    price: f64,
}

#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    #[serde(default, deserialize_with = "lenient_i64")]
    status: i64,
    #[serde(default)]
    message: String,
}

/// The gateway encodes numbers either as JSON numbers or as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Number(T),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match Option::<Lenient<f64>>::deserialize(d)? {
        None => Ok(0.0),
        Some(Lenient::Number(value)) => Ok(value),
        Some(Lenient::Text(raw)) => raw.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Option::<Lenient<i64>>::deserialize(d)? {
        None => Ok(0),
        Some(Lenient::Number(value)) => Ok(value),
        Some(Lenient::Text(raw)) => raw.trim().parse().map_err(serde::de::Error::custom),
    }
}
