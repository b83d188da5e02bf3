//! Example demonstrating retry callbacks.
//!
//! This example shows how to use the `on_retry` callback to get notified
//! when the transport retries a gateway request. The SMS endpoint points at
//! a closed local port so every attempt fails.
//!
//! # Running
//!
//! ```bash
//! cargo run --example retry_callbacks
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use url::Url;
use verify_senders::vonage::{VonageConfig, VonageSender};
use verify_senders::{RetryConfig, VerificationSender};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Track retry count across all deliveries
    let retry_count = Arc::new(AtomicU32::new(0));
    let retry_count_clone = Arc::clone(&retry_count);

    // Configure retry behavior
    let retry_config = RetryConfig::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(1))
        .with_max_retries(3);

    let config = VonageConfig::new(
        "demo_key",
        "demo_secret",
        vec!["14155550100".to_string()],
        "voice.example.com",
    )
    .with_retry(retry_config);

    let sender = VonageSender::builder(config)
        .sms_endpoint(Url::parse("http://127.0.0.1:1")?)
        .on_retry(move |err, delay| {
            let count = retry_count_clone.fetch_add(1, Ordering::SeqCst) + 1;
            println!("Retry #{count} in {delay:?}: {err}");
        })
        .build()?;

    let delivered = sender
        .deliver_sms(&"14155550123".into(), None, &"123456".into())
        .await;

    println!("Delivered: {delivered}");
    println!("Total retries: {}", retry_count.load(Ordering::SeqCst));

    Ok(())
}
