//! Event publication and consumption over Kafka.
//!
//! # Modules
//!
//! - [`publisher`] - Sends committed domain events, keyed by entity id
//! - [`consumer_group`] - Consumer group seam and its rdkafka implementation
//! - [`runner`] - Claim, handle and acknowledge loop hosted by the worker
//! - [`handlers`] - Per-topic message handlers
//! - [`client`] - Producer and consumer client settings

pub mod client;
pub mod consumer_group;
pub mod error;
pub mod handlers;
pub mod publisher;
pub mod runner;

pub use client::{create_consumer_group, create_producer};
pub use consumer_group::{ConsumedMessage, ConsumerGroup, KafkaConsumerGroup};
pub use error::MessagingError;
pub use handlers::{EventHandler, LinkEventHandler, MessageHandler, UserEventHandler, decode_event};
pub use publisher::{Delivery, EventPublisher, KafkaPublisher, encode_event};
pub use runner::{RunnerOptions, RunnerReport, run_consumer};
