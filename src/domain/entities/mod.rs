//! Core domain entities.
//!
//! - [`User`] - A registered account
//! - [`Link`] - A short link owned by a user
//!
//! Entities are plain data. Creation inputs live in separate structs
//! (`NewLink`, `LinkChanges`) so that identifiers and timestamps are only
//! assigned in one place.

pub mod link;
pub mod user;

pub use link::{Link, LinkChanges, NewLink};
pub use user::User;
