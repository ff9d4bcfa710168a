//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mutating use cases go through a
//! transaction object so that the commit point is explicit and observable:
//! only a successful commit yields the [`crate::domain::events::CommitReceipt`]
//! needed to build an event.
//!
//! # Available Repositories
//!
//! - [`UserRepository`] / [`UserTransaction`] - Accounts
//! - [`LinkRepository`] / [`LinkTransaction`] - Short links
//!
//! # Testing
//!
//! Mock implementations of the repository traits are generated via `mockall`.

pub mod link_repository;
pub mod user_repository;

pub use link_repository::{LinkRepository, LinkTransaction};
pub use user_repository::{UserRepository, UserTransaction};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
