//! Topic handlers invoked by the consumer runner.

use async_trait::async_trait;
use std::marker::PhantomData;

use super::{ConsumedMessage, MessagingError};
use crate::domain::events::{DomainEvent, LinkEvent, UserEvent};

/// Processes one claimed message.
///
/// Delivery is at-least-once: the same message can be handed over more than
/// once, so implementations must be idempotent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Returns `Ok` once the message is fully processed. An error leaves the
    /// offset where it is and the message is delivered again.
    async fn handle(&self, message: &ConsumedMessage) -> Result<(), MessagingError>;
}

/// Decodes a message value as an event of type `E`.
///
/// # Errors
///
/// Returns [`MessagingError::Decode`] if the value is missing or is not valid
/// JSON for `E`.
pub fn decode_event<E: DomainEvent>(message: &ConsumedMessage) -> Result<E, MessagingError> {
    let payload = message
        .payload
        .as_deref()
        .ok_or_else(|| MessagingError::Decode("message has no payload".to_string()))?;

    serde_json::from_slice(payload).map_err(MessagingError::decode)
}

/// Handler that decodes events of one kind and records them in the log.
pub struct EventHandler<E> {
    _event: PhantomData<fn() -> E>,
}

pub type UserEventHandler = EventHandler<UserEvent>;
pub type LinkEventHandler = EventHandler<LinkEvent>;

impl<E: DomainEvent> EventHandler<E> {
    pub fn new() -> Self {
        Self {
            _event: PhantomData,
        }
    }
}

impl<E: DomainEvent> Default for EventHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: DomainEvent> MessageHandler for EventHandler<E> {
    async fn handle(&self, message: &ConsumedMessage) -> Result<(), MessagingError> {
        let event: E = decode_event(message).inspect_err(|e| {
            tracing::error!(
                topic = %message.topic,
                partition = message.partition,
                offset = message.offset,
                error = %e,
                "Error decoding {} event",
                E::KIND
            );
        })?;

        tracing::info!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            id = event.id(),
            event = ?event,
            "Received {} event",
            E::KIND
        );
        Ok(())
    }
}
