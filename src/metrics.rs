//! Delivery metrics.
//!
//! Senders receive their metrics sink at construction time; nothing here
//! touches a process-wide registry. Recording is infallible from the
//! caller's point of view, so a misbehaving sink can never change a
//! delivery outcome.

use crate::types::Channel;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Scale applied to gateway prices before they are added to the price counter.
pub const PRICE_SCALE: f64 = 1000.0;

/// Convert a gateway price into integer subunits (`trunc(price × 1000)`).
///
/// Negative and non-finite prices record nothing.
pub fn price_to_subunits(price: f64) -> u64 {
    if !price.is_finite() || price <= 0.0 {
        return 0;
    }
    (price * PRICE_SCALE) as u64
}

/// Sink for the operational metrics of a verification sender.
pub trait DeliveryMetrics: Send + Sync + Debug {
    /// Called once per delivery, before the request is sent.
    fn record_attempt(&self, channel: Channel);

    /// Called when the gateway reports a successful delivery with a price.
    fn record_price(&self, subunits: u64);
}

/// Metrics sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl DeliveryMetrics for NoopMetrics {
    fn record_attempt(&self, _channel: Channel) {}

    fn record_price(&self, _subunits: u64) {}
}

/// In-process atomic counters.
///
/// Useful for health endpoints and tests that need to read the totals back.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    sms_attempts: AtomicU64,
    voice_attempts: AtomicU64,
    price_subunits: AtomicU64,
}

impl CountingMetrics {
    /// Create a new set of zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of delivery attempts recorded for a channel.
    pub fn attempts(&self, channel: Channel) -> u64 {
        match channel {
            Channel::Sms => self.sms_attempts.load(Ordering::Relaxed),
            Channel::Voice => self.voice_attempts.load(Ordering::Relaxed),
        }
    }

    /// Cumulative price in subunits.
    pub fn price_subunits(&self) -> u64 {
        self.price_subunits.load(Ordering::Relaxed)
    }
}

impl DeliveryMetrics for CountingMetrics {
    fn record_attempt(&self, channel: Channel) {
        let counter = match channel {
            Channel::Sms => &self.sms_attempts,
            Channel::Voice => &self.voice_attempts,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_price(&self, subunits: u64) {
        self.price_subunits.fetch_add(subunits, Ordering::Relaxed);
    }
}

#[cfg(feature = "metrics")]
pub use otel::OtelDeliveryMetrics;

#[cfg(feature = "metrics")]
mod otel {
    use super::DeliveryMetrics;
    use crate::types::Channel;
    use opentelemetry::KeyValue;
    use opentelemetry::metrics::{Counter, Meter};

    /// OpenTelemetry counters for delivery attempts and accumulated price.
    ///
    /// - `verify.delivery.attempts` with a `channel` attribute
    /// - `verify.delivery.price` in thousandths of the gateway currency
    #[derive(Debug, Clone)]
    pub struct OtelDeliveryMetrics {
        attempts: Counter<u64>,
        price: Counter<u64>,
        gateway: KeyValue,
    }

    impl OtelDeliveryMetrics {
        /// Create the counters on the given meter, tagging them with the gateway name.
        pub fn new(meter: &Meter, gateway: impl Into<String>) -> Self {
            let attempts = meter
                .u64_counter("verify.delivery.attempts")
                .with_description("Verification deliveries handed to the gateway")
                .build();
            let price = meter
                .u64_counter("verify.delivery.price")
                .with_description("Accumulated delivery price in thousandths")
                .build();
            Self {
                attempts,
                price,
                gateway: KeyValue::new("gateway", gateway.into()),
            }
        }
    }

    impl DeliveryMetrics for OtelDeliveryMetrics {
        fn record_attempt(&self, channel: Channel) {
            self.attempts.add(
                1,
                &[
                    self.gateway.clone(),
                    KeyValue::new("channel", channel.as_str()),
                ],
            );
        }

        fn record_price(&self, subunits: u64) {
            self.price.add(subunits, &[self.gateway.clone()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_to_subunits() {
        assert_eq!(price_to_subunits(0.0333), 33);
        assert_eq!(price_to_subunits(0.25), 250);
        assert_eq!(price_to_subunits(1.0), 1000);
        assert_eq!(price_to_subunits(0.0), 0);
        assert_eq!(price_to_subunits(-0.5), 0);
        assert_eq!(price_to_subunits(f64::NAN), 0);
    }

    #[test]
    fn test_counting_metrics() {
        let metrics = CountingMetrics::new();
        metrics.record_attempt(Channel::Sms);
        metrics.record_attempt(Channel::Sms);
        metrics.record_attempt(Channel::Voice);
        metrics.record_price(33);
        metrics.record_price(250);

        assert_eq!(metrics.attempts(Channel::Sms), 2);
        assert_eq!(metrics.attempts(Channel::Voice), 1);
        assert_eq!(metrics.price_subunits(), 283);
    }
}
