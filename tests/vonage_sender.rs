//! Delivery tests for the Vonage sender against a mock gateway.

use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;
use verify_senders::transport::{BulkheadConfig, CircuitBreakerConfig, CircuitState};
use verify_senders::vonage::{VonageConfig, VonageSender, VonageSenderBuilder};
use verify_senders::{
    Channel, CountingMetrics, Destination, RetryConfig, VerificationCode, VerificationSender,
};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens on port 1, so connecting fails immediately.
const UNREACHABLE: &str = "http://127.0.0.1:1";

fn config() -> VonageConfig {
    VonageConfig::new(
        "key",
        "secret",
        vec!["14155550100".to_string()],
        "voice.example.com",
    )
    .with_retry(RetryConfig::disabled())
}

fn builder(server: &MockServer) -> VonageSenderBuilder {
    let base = Url::parse(&server.uri()).unwrap();
    VonageSender::builder(config())
        .sms_endpoint(base.clone())
        .voice_endpoint(base)
}

#[tokio::test]
async fn test_sms_success_records_price() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sms/json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains(
            "api_key=key&api_secret=secret&from=Signal&to=14155550123&text=",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message-count": "1",
            "price": 0.25
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrics = Arc::new(CountingMetrics::new());
    let sender = builder(&mock_server)
        .metrics(metrics.clone())
        .build()
        .unwrap();

    let delivered = sender
        .deliver_sms(&"14155550123".into(), None, &"123456".into())
        .await;

    assert!(delivered);
    assert_eq!(metrics.attempts(Channel::Sms), 1);
    assert_eq!(metrics.price_subunits(), 250);
}

#[tokio::test]
async fn test_sms_gateway_rejection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sms/json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 2,
            "message": "Missing to param"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrics = Arc::new(CountingMetrics::new());
    let sender = builder(&mock_server)
        .metrics(metrics.clone())
        .build()
        .unwrap();

    let delivered = sender
        .deliver_sms(&"14155550123".into(), Some("ios"), &"123456".into())
        .await;

    assert!(!delivered);
    assert_eq!(metrics.attempts(Channel::Sms), 1);
    assert_eq!(metrics.price_subunits(), 0);
    // Gateway rejections do not count against the dependency's health.
    assert_eq!(sender.transport().circuit_state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_non_json_responses_follow_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("to=14155550001&"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("to=14155550002&"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("to=14155550003&"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{broken", "application/json"),
        )
        .mount(&mock_server)
        .await;

    let metrics = Arc::new(CountingMetrics::new());
    let sender = builder(&mock_server)
        .metrics(metrics.clone())
        .build()
        .unwrap();
    let code: VerificationCode = "123456".into();

    assert!(sender.deliver_sms(&"14155550001".into(), None, &code).await);
    assert!(!sender.deliver_sms(&"14155550002".into(), None, &code).await);
    assert!(sender.deliver_sms(&"14155550003".into(), None, &code).await);

    assert_eq!(metrics.attempts(Channel::Sms), 3);
    assert_eq!(metrics.price_subunits(), 0);
}

#[tokio::test]
async fn test_ios_template_contains_code_twice() {
    let mock_server = MockServer::start().await;

    // sgnl://verify/246810 once form-encoded
    Mock::given(method("POST"))
        .and(path("/sms/json"))
        .and(body_string_contains("code%3A+246810"))
        .and(body_string_contains("sgnl%3A%2F%2Fverify%2F246810"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"price": "0.0333"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrics = Arc::new(CountingMetrics::new());
    let sender = builder(&mock_server)
        .metrics(metrics.clone())
        .build()
        .unwrap();

    assert!(
        sender
            .deliver_sms(&"14155550123".into(), Some("ios"), &"246810".into())
            .await
    );
    assert_eq!(metrics.price_subunits(), 33);
}

#[tokio::test]
async fn test_voice_call_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/calls"))
        .and(header("content-type", "application/json"))
        // base64("key:secret")
        .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
        .and(body_json(json!({
            "to": [{"type": "phone", "number": "14155550123"}],
            "from": {"type": "phone", "number": "14155550199"},
            "ncco": [{
                "action": "talk",
                "text": "Your Verification Code is: 135790",
                "language": "es-ES"
            }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "uuid": "63f61863-4a51-4f6b-86e1-46edebcf9356",
            "status": "started"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metrics = Arc::new(CountingMetrics::new());
    let sender = builder(&mock_server)
        .caller_id("14155550199")
        .metrics(metrics.clone())
        .build()
        .unwrap();

    let delivered = sender
        .deliver_voice(&"14155550123".into(), &"135790".into(), Some("es-ES"))
        .await;

    assert!(delivered);
    assert_eq!(metrics.attempts(Channel::Voice), 1);
    assert_eq!(metrics.attempts(Channel::Sms), 0);
}

#[tokio::test]
async fn test_concurrent_deliveries_resolve_independently() {
    const N: usize = 20;
    let mock_server = MockServer::start().await;

    for i in 0..N {
        let response = if i % 2 == 0 {
            ResponseTemplate::new(200)
                .set_body_json(json!({"price": 0.05}))
                .set_delay(Duration::from_millis(20))
        } else {
            ResponseTemplate::new(400).set_body_json(json!({"status": 3, "message": "Invalid to"}))
        };
        Mock::given(method("POST"))
            .and(body_string_contains(format!("to=1415555{i:04}&")))
            .respond_with(response)
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let metrics = Arc::new(CountingMetrics::new());
    let sender = Arc::new(
        builder(&mock_server)
            .metrics(metrics.clone())
            .build()
            .unwrap(),
    );

    let mut tasks = JoinSet::new();
    for i in 0..N {
        let sender = Arc::clone(&sender);
        tasks.spawn(async move {
            let destination: Destination = format!("1415555{i:04}").into();
            let delivered = sender
                .deliver_sms(&destination, None, &"111111".into())
                .await;
            (i, delivered)
        });
    }

    let mut delivered_count = 0;
    let mut failed_count = 0;
    while let Some(result) = tasks.join_next().await {
        let (i, delivered) = result.unwrap();
        assert_eq!(delivered, i % 2 == 0, "delivery {i}");
        if delivered {
            delivered_count += 1;
        } else {
            failed_count += 1;
        }
    }

    assert_eq!(delivered_count + failed_count, N);
    assert_eq!(delivered_count, N / 2);
    assert_eq!(metrics.attempts(Channel::Sms), N as u64);
    assert_eq!(metrics.price_subunits(), 50 * (N as u64 / 2));
    assert_eq!(sender.transport().occupied(), 0);
}

#[tokio::test]
async fn test_open_circuit_skips_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = config().with_circuit_breaker(
        CircuitBreakerConfig::default()
            .with_ring_buffer_size_in_closed_state(2)
            .with_wait_duration_in_open_state(Duration::from_secs(60)),
    );
    let sender = VonageSender::builder(config)
        .sms_endpoint(Url::parse(UNREACHABLE).unwrap())
        .voice_endpoint(Url::parse(&mock_server.uri()).unwrap())
        .build()
        .unwrap();
    let code: VerificationCode = "123456".into();

    assert!(!sender.deliver_sms(&"14155550123".into(), None, &code).await);
    assert!(!sender.deliver_sms(&"14155550123".into(), None, &code).await);
    assert_eq!(sender.transport().circuit_state(), CircuitState::Open);

    // Both channels share one breaker.
    assert!(!sender.deliver_voice(&"14155550123".into(), &code, None).await);
}

#[tokio::test]
async fn test_full_queue_fails_fast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"price": 0.1}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let sender = Arc::new(
        builder(&mock_server)
            .bulkhead(BulkheadConfig::new(1, 0))
            .build()
            .unwrap(),
    );

    let slow = {
        let sender = Arc::clone(&sender);
        tokio::spawn(async move {
            sender
                .deliver_sms(&"14155550123".into(), None, &"1".into())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = std::time::Instant::now();
    let rejected = sender
        .deliver_sms(&"14155550124".into(), None, &"2".into())
        .await;
    assert!(!rejected);
    assert!(started.elapsed() < Duration::from_millis(150));

    assert!(slow.await.unwrap());
}

#[tokio::test]
async fn test_transport_errors_are_retried() {
    let retries = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&retries);

    let config = config().with_retry(
        RetryConfig::default()
            .with_min_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
            .with_max_retries(2),
    );
    let metrics = Arc::new(CountingMetrics::new());
    let sender = VonageSender::builder(config)
        .sms_endpoint(Url::parse(UNREACHABLE).unwrap())
        .metrics(metrics.clone())
        .on_retry(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let delivered = sender
        .deliver_sms(&"14155550123".into(), None, &"123456".into())
        .await;

    assert!(!delivered);
    assert_eq!(retries.load(Ordering::SeqCst), 2);
    // Retries happen below the sender; the attempt is counted once.
    assert_eq!(metrics.attempts(Channel::Sms), 1);
}
