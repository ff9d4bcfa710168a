//! Repository traits for user data access.

use crate::domain::entities::User;
use crate::domain::events::CommitReceipt;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for users.
///
/// Writes go through a [`UserTransaction`] obtained from [`UserRepository::begin`].
/// Reads that do not feed a write are served directly.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Opens a transaction scope.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if no connection could be acquired.
    async fn begin(&self) -> Result<Box<dyn UserTransaction>, AppError>;

    /// Finds a user by id outside of any transaction.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

/// A unit of work over the `users` table.
///
/// Dropping the transaction without calling [`UserTransaction::commit`] rolls
/// every change back.
#[async_trait]
pub trait UserTransaction: Send {
    /// Counts users with the given id (0 or 1).
    async fn count_by_id(&mut self, id: &str) -> Result<i64, AppError>;

    /// Loads a user inside the transaction.
    async fn find_by_id(&mut self, id: &str) -> Result<Option<User>, AppError>;

    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the id is taken.
    async fn insert(&mut self, user: &User) -> Result<(), AppError>;

    /// Overwrites name, password and `updated_at` of an existing user.
    async fn update(&mut self, user: &User) -> Result<(), AppError>;

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if the store rejects the commit. In that
    /// case nothing was written.
    async fn commit(self: Box<Self>) -> Result<CommitReceipt, AppError>;
}
