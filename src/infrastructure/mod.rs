//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and event messaging.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`messaging`] - Kafka publisher, consumer group and runner

pub mod messaging;
pub mod persistence;
