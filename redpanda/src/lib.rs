//! Redpanda/Kafka publisher for bookshop domain events.
//!
//! Implements [`EventPublisher`] on top of an rdkafka [`FutureProducer`].
//! Works with any Kafka-compatible broker (Redpanda, Apache Kafka, MSK).
//!
//! # Wire format
//!
//! - **Topic**: configurable, `order_placed` by default
//! - **Key**: the order id, so every message about one order lands on one partition
//! - **Payload**: the event as JSON
//! - **Header** `event_type`: versioned type name, e.g. `OrderPlaced.v1`
//!
//! # Delivery
//!
//! `publish_order_placed` resolves once the broker acknowledges the message
//! (per the configured `acks`) or the send timeout elapses. The producer
//! retries transient failures internally; this crate adds no retry loop.
//!
//! # Example
//!
//! ```no_run
//! use bookshop_redpanda::RedpandaEventPublisher;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let publisher = RedpandaEventPublisher::builder()
//!     .brokers("localhost:9092")
//!     .topic("order_placed")
//!     .producer_acks("all")
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use bookshop_core::event::Event;
use bookshop_core::providers::EventPublisher;
use bookshop_core::{OrderPlaced, ShopError};
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use thiserror::Error;

/// Default topic for order notifications.
pub const DEFAULT_ORDER_TOPIC: &str = "order_placed";

/// Errors that can occur while publishing.
#[derive(Error, Debug, Clone)]
pub enum PublisherError {
    /// Failed to create the producer
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to encode the event
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// The broker did not acknowledge the message
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },
}

impl From<PublisherError> for ShopError {
    fn from(err: PublisherError) -> Self {
        Self::infrastructure(err.to_string())
    }
}

/// Redpanda event publisher.
///
/// # Configuration
///
/// - **Broker addresses**: Bootstrap servers (required)
/// - **Topic**: Destination for `OrderPlaced` (default: `order_placed`)
/// - **Producer settings**: Acks, compression, timeout
pub struct RedpandaEventPublisher {
    /// Kafka producer for publishing events
    producer: FutureProducer,
    /// Destination topic for order notifications
    topic: String,
    /// Producer timeout
    timeout: Duration,
}

impl RedpandaEventPublisher {
    /// Create a publisher with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::ConnectionFailed`] if the producer cannot be created.
    pub fn new(brokers: &str) -> Result<Self, PublisherError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder for configuring the publisher.
    #[must_use]
    pub fn builder() -> RedpandaEventPublisherBuilder {
        RedpandaEventPublisherBuilder::default()
    }

    /// Destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    async fn send<E: Event>(&self, key: &str, event: &E) -> Result<(), PublisherError> {
        let payload = event
            .to_json()
            .map_err(|e| PublisherError::SerializationFailed(e.to_string()))?;
        let headers = OwnedHeaders::new().insert(Header {
            key: "event_type",
            value: Some(event.event_type()),
        });

        let record = FutureRecord::to(&self.topic)
            .payload(&payload)
            .key(key)
            .headers(headers);

        match self.producer.send(record, Timeout::After(self.timeout)).await {
            Ok((partition, offset)) => {
                tracing::debug!(
                    topic = %self.topic,
                    partition = partition,
                    offset = offset,
                    event_type = event.event_type(),
                    key = %key,
                    "Event published successfully"
                );
                Ok(())
            }
            Err((kafka_error, _)) => {
                tracing::error!(
                    topic = %self.topic,
                    error = %kafka_error,
                    key = %key,
                    "Failed to publish event"
                );
                Err(PublisherError::PublishFailed {
                    topic: self.topic.clone(),
                    reason: kafka_error.to_string(),
                })
            }
        }
    }
}

/// Builder for configuring a [`RedpandaEventPublisher`].
#[derive(Default)]
pub struct RedpandaEventPublisherBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
}

impl RedpandaEventPublisherBuilder {
    /// Comma-separated list of broker addresses (e.g., "localhost:9092").
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Destination topic for `OrderPlaced`.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the producer acknowledgment mode.
    ///
    /// - `acks`: "0" (no acks), "1" (leader ack), "all" (all replicas ack)
    ///
    /// Default: "all"
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the compression codec: "none", "gzip", "snappy", "lz4", "zstd".
    ///
    /// Default: "none"
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the [`RedpandaEventPublisher`].
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::ConnectionFailed`] if brokers are not set or
    /// the producer configuration is rejected.
    pub fn build(self) -> Result<RedpandaEventPublisher, PublisherError> {
        let brokers = self
            .brokers
            .ok_or_else(|| PublisherError::ConnectionFailed("Brokers not configured".to_string()))?;
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));
        let acks = self.producer_acks.as_deref().unwrap_or("all");
        let compression = self.compression.as_deref().unwrap_or("none");

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", acks)
            .set("compression.type", compression)
            .create()
            .map_err(|e| {
                PublisherError::ConnectionFailed(format!("Failed to create producer: {e}"))
            })?;

        let topic = self
            .topic
            .unwrap_or_else(|| DEFAULT_ORDER_TOPIC.to_string());

        tracing::info!(
            brokers = %brokers,
            topic = %topic,
            acks = acks,
            compression = compression,
            "RedpandaEventPublisher created successfully"
        );

        Ok(RedpandaEventPublisher {
            producer,
            topic,
            timeout,
        })
    }
}

#[async_trait]
impl EventPublisher for RedpandaEventPublisher {
    async fn publish_order_placed(&self, event: &OrderPlaced) -> bookshop_core::Result<()> {
        let key = event.order_id.to_string();
        self.send(&key, event).await.map_err(ShopError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redpanda_event_publisher_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaEventPublisher>();
        assert_sync::<RedpandaEventPublisher>();
    }

    #[test]
    fn builder_without_brokers_fails() {
        let result = RedpandaEventPublisher::builder().topic("orders").build();
        assert!(matches!(result, Err(PublisherError::ConnectionFailed(_))));
    }

    #[test]
    fn publish_failure_maps_to_infrastructure() {
        let err: ShopError = PublisherError::PublishFailed {
            topic: "order_placed".into(),
            reason: "timed out".into(),
        }
        .into();
        assert_eq!(err.kind(), bookshop_core::ErrorKind::Infrastructure);
    }
}
