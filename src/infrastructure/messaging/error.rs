//! Errors raised while publishing or consuming events.

use rdkafka::error::KafkaError;

/// Failure of a broker-facing operation.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// The event could not be encoded; nothing was sent.
    #[error("Failed to serialize event: {0}")]
    Serialization(String),

    /// A consumed message is not a valid event of the expected kind.
    ///
    /// Decoding is deterministic, so redelivering the same message fails the
    /// same way.
    #[error("Failed to decode message: {0}")]
    Decode(String),

    /// The broker was unreachable, rejected the request, or timed out after the
    /// client's own retries.
    #[error("Kafka error: {0}")]
    Transport(#[from] KafkaError),

    /// Consumer group membership or offset bookkeeping problem.
    #[error("Consumer group error: {0}")]
    Group(String),
}

impl MessagingError {
    pub fn serialization(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }

    pub fn decode(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
