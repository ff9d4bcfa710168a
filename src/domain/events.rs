//! Domain events published to the broker.
//!
//! An event is the wire form of a committed entity. Two kinds exist, each bound
//! to a fixed topic:
//!
//! | Kind | Type | Topic |
//! |------|------|-------|
//! | [`EventKind::User`] | [`UserEvent`] | `users` |
//! | [`EventKind::Link`] | [`LinkEvent`] | `links` |
//!
//! The entity id is used as the message key, so every event for the same entity
//! lands on the same partition and is consumed in commit order.
//!
//! # Commit-before-event
//!
//! Events are only built from a [`Committed`] value. A `Committed` value can only
//! be assembled with a [`CommitReceipt`], and receipts are only handed out by a
//! transaction that committed successfully. A rolled-back write therefore has no
//! way to produce an event.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

use crate::domain::entities::{Link, User};

/// Topic of user events.
pub const USERS_TOPIC: &str = "users";
/// Topic of link events.
pub const LINKS_TOPIC: &str = "links";

/// The kind of entity an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    User,
    Link,
}

impl EventKind {
    /// Fixed topic name for this kind.
    pub fn topic(self) -> &'static str {
        match self {
            EventKind::User => USERS_TOPIC,
            EventKind::Link => LINKS_TOPIC,
        }
    }

    /// Resolves a topic name back to its kind.
    pub fn from_topic(topic: &str) -> Option<Self> {
        match topic {
            USERS_TOPIC => Some(EventKind::User),
            LINKS_TOPIC => Some(EventKind::Link),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.topic())
    }
}

/// A serializable event envelope.
pub trait DomainEvent: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    const KIND: EventKind;

    /// Identifier of the entity, used as the message key.
    fn id(&self) -> &str;
}

/// Proof that a store transaction committed.
///
/// Only transaction implementations inside this crate can create one.
#[derive(Debug)]
pub struct CommitReceipt {
    _private: (),
}

impl CommitReceipt {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// An entity value whose write is durable.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    value: T,
}

impl<T> Committed<T> {
    /// Pairs the post-commit state of an entity with the receipt of its commit.
    pub fn new(value: T, _receipt: CommitReceipt) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Event describing the state of a user after a committed change.
///
/// Credentials are never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEvent {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DomainEvent for UserEvent {
    const KIND: EventKind = EventKind::User;

    fn id(&self) -> &str {
        &self.id
    }
}

impl From<&Committed<User>> for UserEvent {
    fn from(committed: &Committed<User>) -> Self {
        let user = committed.get();
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Event describing the state of a link after a committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEvent {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub title: String,
    pub short_url: String,
    pub long_url: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DomainEvent for LinkEvent {
    const KIND: EventKind = EventKind::Link;

    fn id(&self) -> &str {
        &self.id
    }
}

impl From<&Committed<Link>> for LinkEvent {
    fn from(committed: &Committed<Link>) -> Self {
        let link = committed.get();
        Self {
            id: link.id.clone(),
            user_id: link.user_id.clone(),
            title: link.title.clone(),
            short_url: link.short_url.clone(),
            long_url: link.long_url.clone(),
            is_active: link.is_active,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}
