//! PostgreSQL implementation of the user repository.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::User;
use crate::domain::events::CommitReceipt;
use crate::domain::repositories::{UserRepository, UserTransaction};
use crate::error::AppError;

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    password: String,
    created_at: i64,
    updated_at: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            password: row.password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_USER: &str = "SELECT id, name, password, created_at, updated_at FROM users WHERE id = $1";

/// PostgreSQL repository for user accounts.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn begin(&self) -> Result<Box<dyn UserTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUserTransaction { tx }))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as(SELECT_USER)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }
}

/// Open transaction on the `users` table. Rolled back on drop.
pub struct PgUserTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UserTransaction for PgUserTransaction {
    async fn count_by_id(&mut self, id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn find_by_id(&mut self, id: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, password, created_at, updated_at FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(User::from))
    }

    async fn insert(&mut self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.password)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update(&mut self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET name = $2, password = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.password)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "User not found",
                serde_json::json!({ "id": user.id }),
            ));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<CommitReceipt, AppError> {
        self.tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit user transaction");
            AppError::persistence("Failed to commit transaction", serde_json::json!({}))
        })?;

        Ok(CommitReceipt::new())
    }
}
