//! Wire requests for the Vonage SMS and Voice APIs.

use super::config::GatewayCredentials;
use super::errors::RequestError;
use crate::transport::GatewayRequest;
use crate::types::{Channel, ClientType, Destination, VerificationCode, VerificationRequest};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

/// Alphanumeric sender id shown on the handset (where the country allows it).
pub const DEFAULT_SENDER_ID: &str = "Signal";

/// Caller id presented on verification calls.
pub const DEFAULT_CALLER_ID: &str = "0000";

/// Path of the SMS endpoint, relative to the SMS base URL.
pub const SMS_PATH: &str = "sms/json";

/// Path of the call endpoint, relative to the voice base URL.
pub const VOICE_PATH: &str = "v1/calls";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Message text for a client type.
pub fn sms_text(client_type: ClientType, code: &str) -> String {
    match client_type {
        ClientType::Ios => {
            format!("Your Signal verification code: {code}\n\nOr tap: sgnl://verify/{code}")
        }
        ClientType::AndroidNg => {
            format!("<#> Your Signal verification code: {code}\n\ndoDiFGKPO1r")
        }
        ClientType::Generic => format!("Your Signal verification code: {code}"),
    }
}

/// Text spoken on a verification call.
pub fn voice_text(code: &str) -> String {
    format!("Your Verification Code is: {code}")
}

/// Form fields of an outbound SMS, in wire order.
#[derive(Debug, Serialize)]
struct SmsForm<'a> {
    api_key: &'a str,
    api_secret: &'a str,
    from: &'a str,
    to: &'a str,
    text: &'a str,
}

/// Body of a `POST /v1/calls` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Endpoints to call.
    pub to: Vec<CallEndpoint>,
    /// Endpoint presented as the caller.
    pub from: CallEndpoint,
    /// Call-control actions executed once the call is answered.
    pub ncco: Vec<NccoAction>,
}

/// A party to a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CallEndpoint {
    /// A phone number on the public network.
    Phone { number: String },
}

/// One call-control action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum NccoAction {
    /// Read `text` aloud, optionally in a given language.
    Talk {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
}

/// Builds the exact requests the gateway expects.
///
/// Output depends only on the inputs; building the same request twice gives
/// byte-identical bodies.
#[derive(Debug, Clone)]
pub struct VonageRequestBuilder {
    credentials: GatewayCredentials,
    sms_url: Url,
    voice_url: Url,
    sender_id: String,
    caller_id: String,
}

impl VonageRequestBuilder {
    /// Create a builder posting SMS to `{sms_base}/sms/json` and calls to
    /// `{voice_base}/v1/calls`.
    pub fn new(
        credentials: GatewayCredentials,
        sms_base: &Url,
        voice_base: &Url,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            credentials,
            sms_url: join(sms_base, SMS_PATH)?,
            voice_url: join(voice_base, VOICE_PATH)?,
            sender_id: DEFAULT_SENDER_ID.to_string(),
            caller_id: DEFAULT_CALLER_ID.to_string(),
        })
    }

    /// Set the SMS sender id.
    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }

    /// Set the caller id for voice calls.
    pub fn with_caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = caller_id.into();
        self
    }

    /// Resolved SMS endpoint.
    pub fn sms_url(&self) -> &Url {
        &self.sms_url
    }

    /// Resolved voice endpoint.
    pub fn voice_url(&self) -> &Url {
        &self.voice_url
    }

    /// Build the request for any channel.
    pub fn build(&self, request: &VerificationRequest) -> Result<GatewayRequest, RequestError> {
        match request.channel {
            Channel::Sms => self.sms(&request.destination, &request.code, request.client_type()),
            Channel::Voice => self.voice(
                &request.destination,
                &request.code,
                request.locale.as_deref(),
            ),
        }
    }

    /// Build a form-encoded SMS request.
    pub fn sms(
        &self,
        destination: &Destination,
        code: &VerificationCode,
        client_type: ClientType,
    ) -> Result<GatewayRequest, RequestError> {
        let text = sms_text(client_type, code.as_str());
        let form = SmsForm {
            api_key: self.credentials.api_key(),
            api_secret: self.credentials.api_secret(),
            from: &self.sender_id,
            to: destination.as_str(),
            text: &text,
        };
        let body = serde_urlencoded::to_string(&form).map_err(RequestError::EncodeForm)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        Ok(GatewayRequest::post(self.sms_url.clone(), headers, body))
    }

    /// Build a JSON call request with HTTP Basic authentication.
    pub fn voice(
        &self,
        destination: &Destination,
        code: &VerificationCode,
        locale: Option<&str>,
    ) -> Result<GatewayRequest, RequestError> {
        let call = CallRequest {
            to: vec![CallEndpoint::Phone {
                number: destination.to_string(),
            }],
            from: CallEndpoint::Phone {
                number: self.caller_id.clone(),
            },
            ncco: vec![NccoAction::Talk {
                text: voice_text(code.as_str()),
                language: locale.map(str::to_owned),
            }],
        };
        let body = serde_json::to_vec(&call).map_err(RequestError::EncodeJson)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(AUTHORIZATION, self.basic_auth()?);

        Ok(GatewayRequest::post(self.voice_url.clone(), headers, body))
    }

    fn basic_auth(&self) -> Result<HeaderValue, RequestError> {
        let token = STANDARD.encode(format!(
            "{}:{}",
            self.credentials.api_key(),
            self.credentials.api_secret()
        ));
        let mut value =
            HeaderValue::from_str(&format!("Basic {token}")).map_err(RequestError::InvalidHeader)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

fn join(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}/{}", base.as_str().trim_end_matches('/'), path))
}
