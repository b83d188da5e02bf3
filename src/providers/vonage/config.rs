//! Vonage gateway configuration.

use crate::errors::ConfigError;
use crate::transport::{CircuitBreakerConfig, TransportConfig};
use crate::utils::retry::RetryConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;

/// API key and secret used to authenticate against the gateway.
///
/// Immutable once created; the secret is never printed.
#[derive(Clone)]
pub struct GatewayCredentials {
    api_key: String,
    api_secret: SecretString,
}

impl GatewayCredentials {
    /// Create credentials from a key and a secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    /// The API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The API secret.
    pub(crate) fn api_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for the Vonage sender.
///
/// Deserializes from camelCase documents:
///
/// ```rust
/// use verify_senders::vonage::VonageConfig;
///
/// let config = VonageConfig::from_json_str(r#"{
///     "apiKey": "key",
///     "apiSecret": "secret",
///     "numbers": ["14155550100"],
///     "localDomain": "voice.example.com",
///     "retry": { "maxRetries": 2 }
/// }"#).unwrap();
///
/// assert_eq!(config.local_domain, "voice.example.com");
/// assert_eq!(config.retry.max_retries, 2);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VonageConfig {
    /// Gateway API key.
    pub api_key: String,
    /// Gateway API secret.
    pub api_secret: SecretString,
    /// Sender number pool. Validated at load time.
    pub numbers: Vec<String>,
    /// Host that voice-call requests are sent to.
    pub local_domain: String,
    /// Circuit breaker policy for the gateway.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Retry policy for the gateway.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl VonageConfig {
    /// Create a configuration with default circuit breaker and retry policies.
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        numbers: Vec<String>,
        local_domain: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            numbers,
            local_domain: local_domain.into(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Decode and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the circuit breaker policy.
    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Credentials carried by this configuration.
    pub fn credentials(&self) -> GatewayCredentials {
        GatewayCredentials {
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
        }
    }

    /// Transport settings derived from this configuration.
    pub fn transport_config(&self, name: &str) -> TransportConfig {
        TransportConfig::new(name)
            .with_circuit_breaker(self.circuit_breaker.clone())
            .with_retry(self.retry.clone())
    }

    /// Check that every required value is present and every policy is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Empty { field: "apiKey" });
        }
        if self.api_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Empty { field: "apiSecret" });
        }
        if self.numbers.is_empty() {
            return Err(ConfigError::Empty { field: "numbers" });
        }
        if self.numbers.iter().any(|number| number.trim().is_empty()) {
            return Err(ConfigError::invalid("numbers", "contains an empty number"));
        }
        if self.local_domain.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "localDomain",
            });
        }
        self.transport_config("vonage").validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn valid() -> VonageConfig {
        VonageConfig::new(
            "key",
            "secret",
            vec!["14155550100".to_string()],
            "voice.example.com",
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let mut config = valid();
        config.api_key = "  ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty { field: "apiKey" })
        );

        let mut config = valid();
        config.api_secret = SecretString::from(String::new());
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty { field: "apiSecret" })
        );

        let mut config = valid();
        config.numbers.clear();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty { field: "numbers" })
        );

        let mut config = valid();
        config.numbers.push(String::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "numbers", .. })
        ));

        let mut config = valid();
        config.local_domain = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty {
                field: "localDomain"
            })
        );
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let config = valid().with_circuit_breaker(
            CircuitBreakerConfig::default().with_ring_buffer_size_in_closed_state(0),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_defaults() {
        let config = VonageConfig::from_json_str(
            r#"{
                "apiKey": "key",
                "apiSecret": "secret",
                "numbers": ["14155550100"],
                "localDomain": "voice.example.com",
                "circuitBreaker": { "waitDurationInOpenStateMs": 2000 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.api_key, "key");
        assert_eq!(config.credentials().api_secret(), "secret");
        assert_eq!(
            config.circuit_breaker.wait_duration_in_open_state,
            Duration::from_secs(2)
        );
        assert_eq!(config.circuit_breaker.failure_rate_threshold, 50.0);
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    fn test_from_json_missing_field() {
        let result = VonageConfig::from_json_str(
            r#"{ "apiKey": "key", "apiSecret": "secret", "numbers": ["1"] }"#,
        );
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_from_json_blank_value() {
        let result = VonageConfig::from_json_str(
            r#"{ "apiKey": "", "apiSecret": "secret", "numbers": ["1"], "localDomain": "d" }"#,
        );
        assert_eq!(result.unwrap_err(), ConfigError::Empty { field: "apiKey" });
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", valid());
        assert!(!debug.contains("\"secret\""));
        let debug = format!("{:?}", valid().credentials());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("\"secret\""));
    }
}
