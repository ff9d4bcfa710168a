//! Event publisher.
//!
//! [`KafkaPublisher`] sends one event per call and waits for the broker to
//! acknowledge it. The producer it wraps is configured with `acks=all` and a
//! bounded number of client-level retries (see [`super::client`]); the publisher
//! adds no retry, buffering, or timeout of its own.

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::marker::PhantomData;

use super::MessagingError;
use crate::domain::events::DomainEvent;

/// Broker position assigned to a delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

/// Sends events of one kind to one topic.
///
/// Callers hold an `Option<Arc<dyn EventPublisher<E>>>`; `None` means publishing
/// is disabled and the call is skipped entirely.
#[async_trait]
pub trait EventPublisher<E: DomainEvent>: Send + Sync {
    /// Topic this publisher writes to.
    fn topic(&self) -> &str;

    /// Sends `event`, keyed by its id, and waits for the acknowledgement.
    ///
    /// # Errors
    ///
    /// - [`MessagingError::Serialization`] if the event cannot be encoded or has an empty id
    /// - [`MessagingError::Transport`] if the broker does not acknowledge it
    async fn send(&self, event: &E) -> Result<Delivery, MessagingError>;
}

/// Encodes an event into its message key and JSON value.
pub fn encode_event<E: DomainEvent>(event: &E) -> Result<(String, Vec<u8>), MessagingError> {
    if event.id().is_empty() {
        return Err(MessagingError::Serialization(
            "event id must not be empty".to_string(),
        ));
    }

    let payload = serde_json::to_vec(event).map_err(MessagingError::serialization)?;
    Ok((event.id().to_string(), payload))
}

/// Kafka-backed [`EventPublisher`] for events of type `E`.
pub struct KafkaPublisher<E> {
    producer: FutureProducer,
    topic: String,
    _event: PhantomData<fn(E)>,
}

impl<E: DomainEvent> KafkaPublisher<E> {
    /// Creates a publisher writing to the fixed topic of `E`.
    pub fn new(producer: FutureProducer) -> Self {
        Self::with_topic(producer, E::KIND.topic())
    }

    /// Creates a publisher writing to an explicit topic.
    pub fn with_topic(producer: FutureProducer, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
            _event: PhantomData,
        }
    }
}

#[async_trait]
impl<E: DomainEvent> EventPublisher<E> for KafkaPublisher<E> {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn send(&self, event: &E) -> Result<Delivery, MessagingError> {
        let (key, payload) = encode_event(event).inspect_err(|e| {
            tracing::error!(topic = %self.topic, error = %e, "Failed to serialize event");
        })?;

        let record = FutureRecord::to(self.topic.as_str())
            .key(key.as_str())
            .payload(payload.as_slice());

        match self.producer.send(record, Timeout::Never).await {
            Ok((partition, offset)) => {
                metrics::counter!("events_published_total", "topic" => self.topic.clone())
                    .increment(1);
                tracing::debug!(
                    topic = %self.topic,
                    key = %key,
                    partition,
                    offset,
                    "Event delivered"
                );
                Ok(Delivery { partition, offset })
            }
            Err((e, _)) => {
                metrics::counter!("events_publish_failed_total", "topic" => self.topic.clone())
                    .increment(1);
                tracing::error!(topic = %self.topic, key = %key, error = %e, "Failed to produce event");
                Err(MessagingError::Transport(e))
            }
        }
    }
}
