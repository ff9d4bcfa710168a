//! Broker client construction.

use rdkafka::ClientConfig;
use rdkafka::producer::FutureProducer;

use super::{KafkaConsumerGroup, MessagingError};
use crate::config::KafkaConfig;

/// Client-level retries for a produce request before delivery fails.
const PRODUCER_RETRIES: &str = "3";

/// Producer settings: every in-sync replica must acknowledge a write.
pub fn producer_config(config: &KafkaConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", &config.bootstrap_servers)
        .set("acks", "all")
        .set("retries", PRODUCER_RETRIES)
        .set("message.timeout.ms", config.message_timeout_ms.to_string());
    client
}

/// Consumer settings: offsets are committed explicitly by the runner.
pub fn consumer_config(config: &KafkaConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", &config.bootstrap_servers)
        .set("group.id", &config.group_id)
        .set("auto.offset.reset", config.auto_offset_reset.as_str())
        .set("enable.auto.commit", "false")
        .set("enable.partition.eof", "false");
    client
}

/// Creates the shared producer, or `None` when publishing is disabled.
pub fn create_producer(config: &KafkaConfig) -> Result<Option<FutureProducer>, MessagingError> {
    if !config.producer_enabled {
        tracing::info!("Kafka producer disabled, events will not be published");
        return Ok(None);
    }

    let producer: FutureProducer = producer_config(config).create()?;
    tracing::info!(
        bootstrap_servers = %config.bootstrap_servers,
        "Kafka producer created"
    );
    Ok(Some(producer))
}

/// Creates one consumer group member. Each runner needs its own.
pub fn create_consumer_group(config: &KafkaConfig) -> Result<KafkaConsumerGroup, MessagingError> {
    KafkaConsumerGroup::from_config(&consumer_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OffsetReset;

    fn kafka_config() -> KafkaConfig {
        KafkaConfig {
            bootstrap_servers: "broker-1:9092,broker-2:9092".to_string(),
            producer_enabled: true,
            group_id: "devshort-test".to_string(),
            auto_offset_reset: OffsetReset::Earliest,
            message_timeout_ms: 15_000,
            redelivery_backoff_ms: 1_000,
        }
    }

    #[test]
    fn test_producer_config_requires_full_acks() {
        let client = producer_config(&kafka_config());

        assert_eq!(client.get("acks"), Some("all"));
        assert_eq!(client.get("retries"), Some("3"));
        assert_eq!(client.get("message.timeout.ms"), Some("15000"));
        assert_eq!(
            client.get("bootstrap.servers"),
            Some("broker-1:9092,broker-2:9092")
        );
    }

    #[test]
    fn test_consumer_config_disables_auto_commit() {
        let client = consumer_config(&kafka_config());

        assert_eq!(client.get("group.id"), Some("devshort-test"));
        assert_eq!(client.get("auto.offset.reset"), Some("earliest"));
        assert_eq!(client.get("enable.auto.commit"), Some("false"));
    }

    #[test]
    fn test_disabled_producer_is_absent() {
        let mut config = kafka_config();
        config.producer_enabled = false;

        assert!(create_producer(&config).unwrap().is_none());
    }
}
