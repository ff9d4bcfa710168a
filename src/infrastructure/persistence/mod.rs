//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries. Each mutating use case runs inside a `sqlx::Transaction` wrapped by
//! a `Pg*Transaction`; dropping it without committing rolls back.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - User accounts
//! - [`PgLinkRepository`] - Link storage and retrieval

pub mod pg_link_repository;
pub mod pg_user_repository;

pub use pg_link_repository::{PgLinkRepository, PgLinkTransaction};
pub use pg_user_repository::{PgUserRepository, PgUserTransaction};
