//! Integration tests for [`RedpandaEventPublisher`] against a real Kafka broker.
//!
//! # Running These Tests
//!
//! These tests are marked as `#[ignore]` by default because they require
//! Docker (for testcontainers) and take 15-60 seconds to spin up Kafka.
//!
//! ```bash
//! cargo test -p bookshop-redpanda --test integration_tests -- --ignored
//! ```

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bookshop_core::event::{Event, OrderedBook};
use bookshop_core::providers::EventPublisher;
use bookshop_core::{BookId, OrderId, OrderPlaced, UserId};
use bookshop_redpanda::RedpandaEventPublisher;
use rdkafka::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{Headers, Message};
use std::time::Duration;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::kafka::{KAFKA_PORT, Kafka};

fn order_placed(order_id: i64) -> OrderPlaced {
    OrderPlaced {
        order_id: OrderId::new(order_id),
        user_id: UserId::new("user-1"),
        books: vec![
            OrderedBook {
                book_id: BookId::new(42),
                quantity: 2,
            },
            OrderedBook {
                book_id: BookId::new(7),
                quantity: 1,
            },
        ],
    }
}

/// Publish a warmup event until the broker accepts it (topic auto-creation).
async fn wait_for_kafka_ready(publisher: &RedpandaEventPublisher) {
    let max_attempts = 60;
    for attempt in 1..=max_attempts {
        if publisher.publish_order_placed(&order_placed(0)).await.is_ok() {
            tokio::time::sleep(Duration::from_millis(500)).await;
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(
            attempt != max_attempts,
            "Kafka failed to become ready after {max_attempts} attempts"
        );
    }
}

#[tokio::test]
#[ignore]
async fn test_order_placed_wire_format() {
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
    let brokers = format!("{host}:{port}");

    let publisher = RedpandaEventPublisher::builder()
        .brokers(&brokers)
        .topic("order_placed")
        .build()
        .expect("Failed to create publisher");
    wait_for_kafka_ready(&publisher).await;

    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", "wire-format-test")
        .set("auto.offset.reset", "earliest")
        .create()
        .expect("Failed to create consumer");
    consumer
        .subscribe(&["order_placed"])
        .expect("Failed to subscribe");

    let event = order_placed(12);
    publisher
        .publish_order_placed(&event)
        .await
        .expect("Failed to publish");

    let received = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let message = consumer.recv().await.expect("Failed to receive");
            // Skip warmup events.
            if message.key() != Some(b"12".as_slice()) {
                continue;
            }

            let payload = message.payload().expect("message has a payload");
            let decoded = OrderPlaced::from_json(payload).expect("payload is OrderPlaced JSON");

            let headers = message.headers().expect("message has headers");
            let event_type = headers
                .iter()
                .find(|header| header.key == "event_type")
                .and_then(|header| header.value)
                .map(|value| String::from_utf8_lossy(value).into_owned());

            return (decoded, event_type);
        }
    })
    .await
    .expect("Timeout waiting for event");

    assert_eq!(received.0, event);
    assert_eq!(received.1.as_deref(), Some("OrderPlaced.v1"));
}
