//! Publish step of the commit-then-publish write path.

use serde_json::json;

use crate::domain::events::{Committed, DomainEvent};
use crate::error::AppError;
use crate::infrastructure::messaging::EventPublisher;

/// Sends the event describing a committed entity.
///
/// Takes a [`Committed`] value, so it cannot be reached before the write's
/// transaction has committed. With no publisher configured this is a no-op.
///
/// # Errors
///
/// Returns [`AppError::EventPublish`] if the broker does not acknowledge the
/// event. The write stays committed.
pub async fn publish_committed<T, E>(
    publisher: Option<&dyn EventPublisher<E>>,
    committed: &Committed<T>,
) -> Result<(), AppError>
where
    E: DomainEvent + for<'a> From<&'a Committed<T>>,
{
    let Some(publisher) = publisher else {
        tracing::debug!(kind = %E::KIND, "Event publishing disabled, skipping");
        return Ok(());
    };

    let event = E::from(committed);
    match publisher.send(&event).await {
        Ok(delivery) => {
            tracing::debug!(
                topic = publisher.topic(),
                key = event.id(),
                partition = delivery.partition,
                offset = delivery.offset,
                "Published {} event",
                E::KIND
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                topic = publisher.topic(),
                key = event.id(),
                error = %e,
                "Change committed but its event was not published"
            );
            Err(AppError::event_publish(
                "Change was saved but its event could not be published",
                json!({ "kind": E::KIND.to_string(), "id": event.id() }),
            ))
        }
    }
}
