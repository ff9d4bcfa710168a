//! Consumer group membership and offset bookkeeping.
//!
//! [`ConsumerGroup`] is the seam between the runner and the broker client. The
//! runner only needs five things from a group: join a topic, claim the next
//! message, acknowledge it, rewind to it, and hand over a channel of
//! asynchronous client faults. [`KafkaConsumerGroup`] implements it on top of
//! an rdkafka [`StreamConsumer`].

use async_trait::async_trait;
use rdkafka::consumer::{CommitMode, Consumer, ConsumerContext, Rebalance, StreamConsumer};
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::{ClientContext, Message, Offset, TopicPartitionList};
use std::time::Duration;
use tokio::sync::mpsc;

use super::MessagingError;

const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// A message claimed from a partition, detached from the client's buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
    /// Broker timestamp in epoch milliseconds, when available.
    pub timestamp: Option<i64>,
}

impl ConsumedMessage {
    /// Message key as text, if present and valid UTF-8.
    pub fn key_str(&self) -> Option<&str> {
        self.key.as_deref().and_then(|k| std::str::from_utf8(k).ok())
    }
}

/// A member of a consumer group, as seen by the runner.
///
/// `claim` must be cancel-safe: dropping its future must not lose a message.
#[async_trait]
pub trait ConsumerGroup: Send + Sync {
    /// Joins the group for `topic`. Partition claims are assigned by the broker.
    fn subscribe(&self, topic: &str) -> Result<(), MessagingError>;

    /// Waits for the next message from any assigned partition.
    async fn claim(&self) -> Result<ConsumedMessage, MessagingError>;

    /// Advances the committed offset of the message's partition past it.
    fn acknowledge(&self, message: &ConsumedMessage) -> Result<(), MessagingError>;

    /// Rewinds the message's partition so that the next claim returns it again.
    fn redeliver(&self, message: &ConsumedMessage) -> Result<(), MessagingError>;

    /// Takes the receiver of asynchronous client faults. Returns `None` after the
    /// first call, or if the group has no such channel.
    fn take_errors(&mut self) -> Option<mpsc::UnboundedReceiver<MessagingError>>;

    /// Leaves the group and releases the client.
    fn close(self)
    where
        Self: Sized;
}

/// rdkafka context forwarding client, rebalance and commit errors to the
/// runner's fault channel.
pub struct GroupContext {
    faults: mpsc::UnboundedSender<MessagingError>,
}

impl GroupContext {
    fn fault(&self, error: KafkaError) {
        let _ = self.faults.send(MessagingError::Transport(error));
    }
}

impl ClientContext for GroupContext {
    fn error(&self, error: KafkaError, reason: &str) {
        tracing::debug!(error = %error, reason, "Kafka client error");
        self.fault(error);
    }
}

impl ConsumerContext for GroupContext {
    fn post_rebalance(&self, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Assign(partitions) => {
                tracing::info!(partitions = partitions.count(), "Partitions assigned");
            }
            Rebalance::Revoke(partitions) => {
                tracing::info!(partitions = partitions.count(), "Partitions revoked");
            }
            Rebalance::Error(e) => {
                tracing::debug!(error = %e, "Rebalance failed");
                self.fault(e.clone());
            }
        }
    }

    fn commit_callback(&self, result: KafkaResult<()>, offsets: &TopicPartitionList) {
        if let Err(e) = result {
            tracing::debug!(error = %e, partitions = offsets.count(), "Offset commit failed");
            self.fault(e);
        }
    }
}

/// Kafka consumer group member.
pub struct KafkaConsumerGroup {
    consumer: StreamConsumer<GroupContext>,
    faults: Option<mpsc::UnboundedReceiver<MessagingError>>,
}

impl KafkaConsumerGroup {
    /// Creates a group member from a prepared client configuration.
    pub fn from_config(config: &rdkafka::ClientConfig) -> Result<Self, MessagingError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let consumer: StreamConsumer<GroupContext> =
            config.create_with_context(GroupContext { faults: tx })?;

        Ok(Self {
            consumer,
            faults: Some(rx),
        })
    }
}

#[async_trait]
impl ConsumerGroup for KafkaConsumerGroup {
    fn subscribe(&self, topic: &str) -> Result<(), MessagingError> {
        self.consumer.subscribe(&[topic])?;
        Ok(())
    }

    async fn claim(&self) -> Result<ConsumedMessage, MessagingError> {
        let message = self.consumer.recv().await?;

        Ok(ConsumedMessage {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(<[u8]>::to_vec),
            payload: message.payload().map(<[u8]>::to_vec),
            timestamp: message.timestamp().to_millis(),
        })
    }

    fn acknowledge(&self, message: &ConsumedMessage) -> Result<(), MessagingError> {
        let mut offsets = TopicPartitionList::new();
        offsets.add_partition_offset(
            &message.topic,
            message.partition,
            Offset::Offset(message.offset + 1),
        )?;
        // Async commit keeps the runtime thread free. A lost commit only means
        // redelivery, and its failure reaches the fault channel via commit_callback.
        self.consumer.commit(&offsets, CommitMode::Async)?;
        Ok(())
    }

    fn redeliver(&self, message: &ConsumedMessage) -> Result<(), MessagingError> {
        // The seek must complete before the next claim, so it blocks off the
        // async worker threads. Requires the multi-threaded runtime.
        tokio::task::block_in_place(|| {
            self.consumer.seek(
                &message.topic,
                message.partition,
                Offset::Offset(message.offset),
                SEEK_TIMEOUT,
            )
        })?;
        Ok(())
    }

    fn take_errors(&mut self) -> Option<mpsc::UnboundedReceiver<MessagingError>> {
        self.faults.take()
    }

    fn close(self) {
        self.consumer.unsubscribe();
        tracing::debug!("Consumer left the group");
    }
}
