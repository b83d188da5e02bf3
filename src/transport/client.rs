//! Fault-tolerant HTTP client.

use super::bulkhead::Bulkhead;
use super::circuit_breaker::{CircuitBreaker, CircuitState};
use super::config::TransportConfig;
use super::error::TransportError;
use crate::errors::RetryableError;
use crate::utils::retry::RetryConfig;
use backon::Retryable;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use tracing::{Instrument, debug};

/// Callback type for retry notifications.
///
/// Invoked each time a failed attempt is about to be retried, with the error
/// that caused the retry and the delay before the next attempt.
pub type OnRetryCallback = Arc<dyn Fn(&TransportError, Duration) + Send + Sync>;

/// A fully built outbound request.
///
/// Owned so it can be moved onto the worker pool and replayed on retry.
#[derive(Clone)]
pub struct GatewayRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Encoded request body.
    pub body: Vec<u8>,
}

impl GatewayRequest {
    /// Create a POST request.
    pub fn post(url: Url, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::POST,
            url,
            headers,
            body: body.into(),
        }
    }

    /// Body as UTF-8 text, if it is valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

// Bodies and headers carry credentials.
impl fmt::Debug for GatewayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("body", &format_args!("[{} bytes]", self.body.len()))
            .finish()
    }
}

/// Raw response handed back by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Value of the `Content-Type` header, if present and valid text.
    pub content_type: Option<String>,
    /// Response body.
    pub body: String,
}

/// HTTP client wrapped in a bulkhead, a circuit breaker and a retry policy.
///
/// One instance is meant per external dependency so that a slow or failing
/// dependency only exhausts its own resources. The handle is immutable and
/// cheap to clone; clones share the breaker and the worker pool.
///
/// # Example
///
/// ```rust,ignore
/// use verify_senders::transport::{FaultTolerantClient, TransportConfig};
///
/// let client = FaultTolerantClient::new(TransportConfig::new("gateway"))?;
/// let response = client.send(request).await?;
/// println!("status: {}", response.status);
/// ```
#[derive(Clone)]
pub struct FaultTolerantClient {
    name: Arc<str>,
    http_client: ClientWithMiddleware,
    breaker: Arc<CircuitBreaker>,
    bulkhead: Bulkhead,
    retry: RetryConfig,
    on_retry: Option<OnRetryCallback>,
}

impl fmt::Debug for FaultTolerantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultTolerantClient")
            .field("name", &self.name)
            .field("circuit_state", &self.breaker.state())
            .field("bulkhead", &self.bulkhead)
            .field("retry", &self.retry)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "..."))
            .finish()
    }
}

impl FaultTolerantClient {
    /// Build a client with its own HTTP connection pool.
    ///
    /// Redirects are never followed. HTTP/2 is used whenever the server
    /// negotiates it.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::BuildHttpClient)?;

        Self::with_http_client(config, ClientBuilder::new(client).build())
    }

    /// Build a client around an existing HTTP client with middleware.
    ///
    /// Timeouts and redirect policy are whatever `http_client` was built with.
    pub fn with_http_client(
        config: TransportConfig,
        http_client: ClientWithMiddleware,
    ) -> Result<Self, TransportError> {
        config.validate()?;

        Ok(Self {
            breaker: Arc::new(CircuitBreaker::new(
                config.name.clone(),
                config.circuit_breaker.clone(),
            )),
            bulkhead: Bulkhead::new(config.bulkhead),
            name: Arc::from(config.name),
            http_client,
            retry: config.retry,
            on_retry: None,
        })
    }

    /// Set a callback to be invoked on each retry attempt.
    pub fn with_on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TransportError, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Name of the dependency this client talks to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current circuit breaker state.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Stop accepting requests.
    ///
    /// Requests already executing run to completion. Queued and new
    /// requests fail with [`TransportError::PoolClosed`]. Clones share the
    /// pool, so closing one handle closes them all.
    pub fn close(&self) {
        self.bulkhead.close();
    }

    /// Requests currently executing or waiting for a worker.
    pub fn occupied(&self) -> usize {
        self.bulkhead.occupied()
    }

    /// Send a request through the bulkhead, breaker and retry policy.
    ///
    /// Fails immediately with [`TransportError::PoolClosed`],
    /// [`TransportError::QueueFull`] or [`TransportError::CircuitOpen`] when
    /// the request cannot be admitted.
    /// Once admitted the request runs on its own task until it completes or
    /// exhausts its retries, even if the returned future is dropped.
    pub async fn send(&self, request: GatewayRequest) -> Result<GatewayResponse, TransportError> {
        if self.bulkhead.is_closed() {
            return Err(TransportError::PoolClosed {
                name: self.name.to_string(),
            });
        }

        let slot = self
            .bulkhead
            .try_reserve()
            .ok_or_else(|| TransportError::QueueFull {
                name: self.name.to_string(),
                capacity: self.bulkhead.capacity(),
            })?;

        if !self.breaker.try_acquire() {
            return Err(TransportError::CircuitOpen {
                name: self.name.to_string(),
            });
        }

        let this = self.clone();
        let attempt = async move {
            let result = async {
                let _permit = slot
                    .acquire_worker()
                    .await
                    .map_err(|_| TransportError::PoolClosed {
                        name: this.name.to_string(),
                    })?;
                this.execute_with_retry(&request).await
            }
            .await;

            match &result {
                Ok(_) => this.breaker.on_success(),
                Err(e) if e.is_rejected_locally() => {}
                Err(_) => this.breaker.on_failure(),
            }
            drop(slot);
            result
        };

        // Keep transport records inside the caller's span.
        #[cfg(feature = "tracing")]
        let attempt = attempt.in_current_span();

        tokio::spawn(attempt)
            .await
            .map_err(TransportError::Aborted)?
    }

    async fn execute_with_retry(
        &self,
        request: &GatewayRequest,
    ) -> Result<GatewayResponse, TransportError> {
        (|| async move { self.execute_once(request).await })
            .retry(self.retry.build_strategy())
            .when(|err: &TransportError| err.is_retryable())
            .notify(|err, duration| {
                if let Some(callback) = &self.on_retry {
                    callback(err, duration);
                }

                #[cfg(feature = "tracing")]
                debug!(
                    dependency = %self.name,
                    error = %err,
                    retry_after_secs = %duration.as_secs_f64(),
                    "Retrying gateway request"
                );
            })
            .await
    }

    async fn execute_once(&self, request: &GatewayRequest) -> Result<GatewayResponse, TransportError> {
        let response = self
            .http_client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(TransportError::HttpRequest)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(TransportError::ReadBody)?;

        Ok(GatewayResponse {
            status,
            content_type,
            body,
        })
    }
}
