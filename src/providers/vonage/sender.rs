//! Vonage verification sender.

use super::config::VonageConfig;
use super::errors::VonageError;
use super::request::VonageRequestBuilder;
use super::response::DeliveryResponse;
use crate::metrics::{DeliveryMetrics, NoopMetrics};
use crate::providers::traits::VerificationSender;
use crate::transport::{BulkheadConfig, FaultTolerantClient, TransportError};
use crate::types::{Channel, Destination, VerificationCode, VerificationRequest};
use reqwest_middleware::ClientWithMiddleware;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::{Span, error, info, warn};
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Base URL of the Vonage SMS API.
pub const DEFAULT_SMS_BASE_URL: &str = "https://rest.nexmo.com";

/// Name of the transport dependency, used in logs.
const GATEWAY_NAME: &str = "vonage";

/// Verification sender backed by the Vonage SMS and Voice APIs.
///
/// All requests share one [`FaultTolerantClient`], so a failing gateway
/// trips a single breaker and saturates a single worker pool regardless of
/// channel. The sender is immutable after construction; share it behind an
/// [`Arc`] to deliver from many tasks at once.
///
/// # Example
///
/// ```rust,ignore
/// use verify_senders::vonage::{VonageConfig, VonageSender};
/// use verify_senders::VerificationSender;
///
/// let config = VonageConfig::new("key", "secret", vec!["14155550100".into()], "voice.example.com");
/// let sender = VonageSender::new(config)?;
///
/// let delivered = sender
///     .deliver_sms(&"14155550123".into(), Some("ios"), &"123456".into())
///     .await;
/// ```
#[derive(Debug, Clone)]
pub struct VonageSender {
    requests: VonageRequestBuilder,
    transport: FaultTolerantClient,
    metrics: Arc<dyn DeliveryMetrics>,
}

/// Builder for configuring a [`VonageSender`].
pub struct VonageSenderBuilder {
    config: VonageConfig,
    sms_endpoint: Option<Url>,
    voice_endpoint: Option<Url>,
    sender_id: Option<String>,
    caller_id: Option<String>,
    metrics: Option<Arc<dyn DeliveryMetrics>>,
    http_client: Option<ClientWithMiddleware>,
    bulkhead: Option<BulkheadConfig>,
    request_timeout: Option<Duration>,
    on_retry: Option<Box<dyn Fn(&TransportError, Duration) + Send + Sync>>,
}

impl VonageSenderBuilder {
    /// Create a new builder for the given configuration.
    pub fn new(config: VonageConfig) -> Self {
        Self {
            config,
            sms_endpoint: None,
            voice_endpoint: None,
            sender_id: None,
            caller_id: None,
            metrics: None,
            http_client: None,
            bulkhead: None,
            request_timeout: None,
            on_retry: None,
        }
    }

    /// Override the SMS base URL (default [`DEFAULT_SMS_BASE_URL`]).
    pub fn sms_endpoint(mut self, endpoint: Url) -> Self {
        self.sms_endpoint = Some(endpoint);
        self
    }

    /// Override the voice base URL (default `https://{localDomain}`).
    pub fn voice_endpoint(mut self, endpoint: Url) -> Self {
        self.voice_endpoint = Some(endpoint);
        self
    }

    /// Set the SMS sender id.
    pub fn sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Set the caller id presented on voice calls.
    pub fn caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    /// Set the metrics sink.
    pub fn metrics(mut self, metrics: Arc<dyn DeliveryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the worker pool and queue sizes.
    pub fn bulkhead(mut self, bulkhead: BulkheadConfig) -> Self {
        self.bulkhead = Some(bulkhead);
        self
    }

    /// Set a total timeout for each HTTP attempt.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set a callback to be invoked on each retry attempt.
    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TransportError, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Box::new(callback));
        self
    }

    /// Validate the configuration and build the [`VonageSender`].
    pub fn build(self) -> Result<VonageSender, VonageError> {
        self.config.validate()?;

        let sms_base = match self.sms_endpoint {
            Some(url) => url,
            None => parse_endpoint("sms", DEFAULT_SMS_BASE_URL.to_string())?,
        };
        let voice_base = match self.voice_endpoint {
            Some(url) => url,
            None => parse_endpoint("voice", format!("https://{}", self.config.local_domain))?,
        };

        let mut requests = VonageRequestBuilder::new(self.config.credentials(), &sms_base, &voice_base)
            .map_err(|source| VonageError::InvalidEndpoint {
                channel: "gateway",
                url: sms_base.to_string(),
                source,
            })?;
        if let Some(sender_id) = self.sender_id {
            requests = requests.with_sender_id(sender_id);
        }
        if let Some(caller_id) = self.caller_id {
            requests = requests.with_caller_id(caller_id);
        }

        let mut transport_config = self.config.transport_config(GATEWAY_NAME);
        if let Some(bulkhead) = self.bulkhead {
            transport_config = transport_config.with_bulkhead(bulkhead);
        }
        if let Some(timeout) = self.request_timeout {
            transport_config = transport_config.with_request_timeout(timeout);
        }

        let mut transport = match self.http_client {
            Some(client) => FaultTolerantClient::with_http_client(transport_config, client)?,
            None => FaultTolerantClient::new(transport_config)?,
        };
        if let Some(callback) = self.on_retry {
            transport = transport.with_on_retry(callback);
        }

        Ok(VonageSender {
            requests,
            transport,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics)),
        })
    }
}

fn parse_endpoint(channel: &'static str, url: String) -> Result<Url, VonageError> {
    Url::parse(&url).map_err(|source| VonageError::InvalidEndpoint {
        channel,
        url,
        source,
    })
}

impl VonageSender {
    /// Create a sender with default endpoints, metrics and transport sizing.
    pub fn new(config: VonageConfig) -> Result<Self, VonageError> {
        Self::builder(config).build()
    }

    /// Create a builder for fine-grained configuration.
    pub fn builder(config: VonageConfig) -> VonageSenderBuilder {
        VonageSenderBuilder::new(config)
    }

    /// The underlying transport, for health reporting.
    pub fn transport(&self) -> &FaultTolerantClient {
        &self.transport
    }

    /// The request builder in use.
    pub fn requests(&self) -> &VonageRequestBuilder {
        &self.requests
    }

    /// Build, send, classify and resolve one delivery.
    ///
    /// Never fails: every error is logged and resolves to `false`.
    pub async fn deliver(&self, request: VerificationRequest) -> bool {
        let channel = request.channel;

        let gateway_request = match self.requests.build(&request) {
            Ok(gateway_request) => gateway_request,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                {
                    warn!(%channel, error = %_e, "Failed to build Vonage request");
                    Span::current().set_status(Status::error(_e.to_string()));
                }
                return false;
            }
        };

        self.metrics.record_attempt(channel);

        match self.transport.send(gateway_request).await {
            Ok(response) => self.resolve(channel, DeliveryResponse::from_gateway(&response)),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                {
                    // The request task died without producing a result.
                    if matches!(_e, TransportError::Aborted(_)) {
                        error!(%channel, error = %_e, "Vonage request task did not complete");
                    } else if _e.is_rejected_locally() {
                        warn!(%channel, error = %_e, "Vonage request rejected before sending");
                    } else {
                        warn!(%channel, error = %_e, "Failed to send Vonage request");
                    }
                    Span::current().set_status(Status::error(_e.to_string()));
                }
                false
            }
        }
    }

    fn resolve(&self, _channel: Channel, response: DeliveryResponse) -> bool {
        match &response {
            DeliveryResponse::Success { .. } => {
                self.metrics.record_price(response.price_subunits());
            }
            DeliveryResponse::Failure { status: _s, message: _m } => {
                #[cfg(feature = "tracing")]
                info!(channel = %_channel, status = _s, message = %_m, "Vonage request failed");
            }
            DeliveryResponse::Unparseable { status: _s } => {
                #[cfg(feature = "tracing")]
                {
                    if !_s.is_success() {
                        info!(
                            channel = %_channel,
                            http_status = %_s,
                            "Vonage request failed with a non-JSON response"
                        );
                    }
                }
            }
        }

        let delivered = response.is_delivered();

        #[cfg(feature = "tracing")]
        {
            let span = Span::current();
            span.record("delivered", delivered);
            if delivered {
                span.set_status(Status::Ok);
            } else {
                span.set_status(Status::error("gateway did not accept the message"));
            }
        }

        delivered
    }
}

impl VerificationSender for VonageSender {
    fn name(&self) -> &str {
        GATEWAY_NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "VonageSender::deliver_sms",
            skip_all,
            fields(client_type = client_type.unwrap_or("generic"), delivered = tracing::field::Empty)
        )
    )]
    async fn deliver_sms(
        &self,
        destination: &Destination,
        client_type: Option<&str>,
        code: &VerificationCode,
    ) -> bool {
        let request = VerificationRequest::sms(destination.clone(), code.clone())
            .with_client_type_hint(client_type);
        self.deliver(request).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "VonageSender::deliver_voice",
            skip_all,
            fields(locale = locale.unwrap_or(""), delivered = tracing::field::Empty)
        )
    )]
    async fn deliver_voice(
        &self,
        destination: &Destination,
        code: &VerificationCode,
        locale: Option<&str>,
    ) -> bool {
        let request = VerificationRequest::voice(destination.clone(), code.clone())
            .with_locale(locale);
        self.deliver(request).await
    }
}
