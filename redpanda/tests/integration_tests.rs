//! Integration tests for [`RedpandaEventBus`] against a real Kafka broker.
//!
//! # Running These Tests
//!
//! Marked `#[ignore]`: they need Docker (testcontainers) and take a while to
//! start the broker.
//!
//! ```bash
//! cargo test -p answers-redpanda --test integration_tests -- --ignored
//! ```

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use answers_core::envelope;
use answers_core::event_bus::EventBus;
use answers_redpanda::RedpandaEventBus;
use futures::StreamExt;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::kafka::{KAFKA_PORT, Kafka};

async fn start_kafka() -> (ContainerAsync<Kafka>, String) {
    let kafka = Kafka::default()
        .with_env_var("KAFKA_AUTO_CREATE_TOPICS_ENABLE", "true")
        .start()
        .await
        .expect("Failed to start Kafka container");

    let host = kafka.get_host().await.expect("Failed to get host");
    let port = kafka
        .get_host_port_ipv4(KAFKA_PORT)
        .await
        .expect("Failed to get port");
    (kafka, format!("{host}:{port}"))
}

/// Publish warmup messages until the broker accepts them, which also
/// auto-creates the topic.
async fn ensure_topic_exists(event_bus: &RedpandaEventBus, topic: &str) {
    let warmup = envelope::encode("warmup", b"{}").expect("encode warmup");
    for attempt in 1..=60 {
        if event_bus.publish(topic, &warmup).await.is_ok() {
            tokio::time::sleep(Duration::from_secs(3)).await;
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(attempt != 60, "Failed to create topic {topic}");
    }
}

async fn next_non_warmup(stream: &mut answers_core::event_bus::MessageStream) -> Vec<u8> {
    loop {
        let message = stream
            .next()
            .await
            .expect("stream ended")
            .expect("stream error");
        let (tag, _) = envelope::decode(&message).expect("valid envelope");
        if tag != "warmup" {
            return message;
        }
    }
}

#[tokio::test]
#[ignore]
async fn envelope_bytes_survive_the_broker_unchanged() {
    let (_kafka, brokers) = start_kafka().await;

    let event_bus = RedpandaEventBus::builder()
        .brokers(&brokers)
        .consumer_group("round-trip")
        .build()
        .expect("Failed to create event bus");
    ensure_topic_exists(&event_bus, "users").await;

    let mut stream = event_bus.subscribe(&["users"]).await.expect("subscribe");

    let message = envelope::encode(
        "userCreated",
        br#"{"id":"u1","firstName":"Ada","lastName":"Lovelace","memberSince":"2016-01-01T00:00:00Z"}"#,
    )
    .expect("encode");
    event_bus.publish("users", &message).await.expect("publish");

    let received = tokio::time::timeout(Duration::from_secs(20), next_non_warmup(&mut stream))
        .await
        .expect("timed out waiting for message");
    assert_eq!(received, message);
}

#[tokio::test]
#[ignore]
async fn same_tag_messages_keep_their_order() {
    let (_kafka, brokers) = start_kafka().await;

    let event_bus = RedpandaEventBus::builder()
        .brokers(&brokers)
        .consumer_group("ordering")
        .build()
        .expect("Failed to create event bus");
    ensure_topic_exists(&event_bus, "discussions").await;

    let mut stream = event_bus
        .subscribe(&["discussions"])
        .await
        .expect("subscribe");

    let messages: Vec<Vec<u8>> = (0..5)
        .map(|i| {
            envelope::encode("discussionStarted", format!(r#"{{"seq":{i}}}"#).as_bytes())
                .expect("encode")
        })
        .collect();
    for message in &messages {
        event_bus.publish("discussions", message).await.expect("publish");
    }

    let received = tokio::time::timeout(Duration::from_secs(30), async {
        let mut received = Vec::new();
        while received.len() < messages.len() {
            received.push(next_non_warmup(&mut stream).await);
        }
        received
    })
    .await
    .expect("timed out waiting for messages");

    assert_eq!(received, messages);
}
