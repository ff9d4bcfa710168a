//! Domain layer containing business entities, events and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`events`] - Event envelopes published after a commit
//!
//! # Write and Publish Flow
//!
//! 1. A service opens a transaction from a repository
//! 2. The transaction commits and returns a [`events::CommitReceipt`]
//! 3. The entity is wrapped in [`events::Committed`]
//! 4. An event is built from the committed value and handed to a publisher

pub mod entities;
pub mod events;
pub mod repositories;
