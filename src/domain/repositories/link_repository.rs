//! Repository traits for short link data access.

use crate::domain::entities::Link;
use crate::domain::events::CommitReceipt;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for managing short links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Opens a transaction scope for a mutating use case.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if no connection could be acquired.
    async fn begin(&self) -> Result<Box<dyn LinkTransaction>, AppError>;

    /// Finds a link by id, restricted to links owned by `user_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if the link does not exist or belongs to someone else
    async fn find_by_id_and_user(&self, id: &str, user_id: &str)
    -> Result<Option<Link>, AppError>;

    /// Lists the links of a user, newest first.
    ///
    /// When `active_only` is set, links with `is_active = false` are skipped.
    async fn list_by_user(&self, user_id: &str, active_only: bool) -> Result<Vec<Link>, AppError>;
}

/// A unit of work over the `links` table.
///
/// Dropping the transaction without calling [`LinkTransaction::commit`] rolls
/// every change back.
#[async_trait]
pub trait LinkTransaction: Send {
    /// Returns true if the owning user exists.
    async fn user_exists(&mut self, user_id: &str) -> Result<bool, AppError>;

    /// Loads a link owned by `user_id`, locking the row for the rest of the transaction.
    async fn find_by_id_and_user(
        &mut self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Link>, AppError>;

    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if `short_url` is already taken.
    async fn insert(&mut self, link: &Link) -> Result<(), AppError>;

    /// Overwrites the editable fields and `updated_at` of an existing link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the new `short_url` is already taken.
    async fn update(&mut self, link: &Link) -> Result<(), AppError>;

    /// Deletes a link. Returns `Ok(false)` if no row matched.
    async fn delete(&mut self, id: &str) -> Result<bool, AppError>;

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if the store rejects the commit.
    async fn commit(self: Box<Self>) -> Result<CommitReceipt, AppError>;
}
