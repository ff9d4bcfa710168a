//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::Link;
use crate::domain::events::CommitReceipt;
use crate::domain::repositories::{LinkRepository, LinkTransaction};
use crate::error::AppError;

#[derive(FromRow)]
struct LinkRow {
    id: String,
    user_id: String,
    title: String,
    short_url: String,
    long_url: String,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            short_url: r.short_url,
            long_url: r.long_url,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Uses SQLx prepared statements for SQL injection protection.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn begin(&self) -> Result<Box<dyn LinkTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLinkTransaction { tx }))
    }

    async fn find_by_id_and_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, short_url, long_url, is_active, created_at, updated_at
            FROM links
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn list_by_user(&self, user_id: &str, active_only: bool) -> Result<Vec<Link>, AppError> {
        let rows: Vec<LinkRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, short_url, long_url, is_active, created_at, updated_at
            FROM links
            WHERE user_id = $1 AND (NOT $2 OR is_active)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(active_only)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }
}

/// Open transaction on the `links` table. Rolled back on drop.
pub struct PgLinkTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LinkTransaction for PgLinkTransaction {
    async fn user_exists(&mut self, user_id: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(exists)
    }

    async fn find_by_id_and_user(
        &mut self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, short_url, long_url, is_active, created_at, updated_at
            FROM links
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Link::from))
    }

    async fn insert(&mut self, link: &Link) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO links (id, user_id, title, short_url, long_url, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&link.id)
        .bind(&link.user_id)
        .bind(&link.title)
        .bind(&link.short_url)
        .bind(&link.long_url)
        .bind(link.is_active)
        .bind(link.created_at)
        .bind(link.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update(&mut self, link: &Link) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET title = $2, short_url = $3, long_url = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(&link.id)
        .bind(&link.title)
        .bind(&link.short_url)
        .bind(&link.long_url)
        .bind(link.is_active)
        .bind(link.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Link not found",
                serde_json::json!({ "link_id": link.id }),
            ));
        }
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<CommitReceipt, AppError> {
        self.tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit link transaction");
            AppError::persistence("Failed to commit transaction", serde_json::json!({}))
        })?;

        Ok(CommitReceipt::new())
    }
}
