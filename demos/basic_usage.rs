//! Basic usage example for Verify Senders.
//!
//! This example demonstrates how to create a Vonage sender and deliver a
//! verification code by SMS, falling back to a voice call.
//!
//! # Running
//!
//! ```bash
//! VONAGE_API_KEY=your_key VONAGE_API_SECRET=your_secret \
//! VONAGE_TO=14155550123 cargo run --example basic_usage
//! ```

use std::env;
use std::sync::Arc;
use verify_senders::vonage::{VonageConfig, VonageSender};
use verify_senders::{Channel, CountingMetrics, Destination, VerificationCode, VerificationSender};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get credentials from environment
    let api_key =
        env::var("VONAGE_API_KEY").expect("VONAGE_API_KEY environment variable must be set");
    let api_secret =
        env::var("VONAGE_API_SECRET").expect("VONAGE_API_SECRET environment variable must be set");
    let to = env::var("VONAGE_TO").expect("VONAGE_TO environment variable must be set");

    // Default policies: breaker opens at 50% failures, one retry after 500ms
    let config = VonageConfig::new(
        api_key,
        api_secret,
        vec!["14155550100".to_string()],
        "api.nexmo.com",
    );

    // Validate the config (the builder does this too)
    config.validate()?;

    // Keep a handle on the counters to read them back afterwards
    let metrics = Arc::new(CountingMetrics::new());
    let sender = VonageSender::builder(config)
        .metrics(metrics.clone())
        .build()?;

    let destination = Destination::new(to);
    let code = VerificationCode::new("123456");

    println!("Sending verification SMS to {destination}...");
    let mut delivered = sender
        .deliver_sms(&destination, Some("android-ng"), &code)
        .await;

    if !delivered {
        println!("SMS was not accepted, calling instead...");
        delivered = sender.deliver_voice(&destination, &code, Some("en-US")).await;
    }

    println!("Delivered: {delivered}");
    println!("  SMS attempts: {}", metrics.attempts(Channel::Sms));
    println!("  Voice attempts: {}", metrics.attempts(Channel::Voice));
    println!("  Price (thousandths): {}", metrics.price_subunits());
    println!("  Circuit: {:?}", sender.transport().circuit_state());

    Ok(())
}
