//! Link management service.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::publishing::publish_committed;
use crate::domain::entities::{Link, LinkChanges, NewLink};
use crate::domain::events::{Committed, LinkEvent};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::messaging::EventPublisher;
use crate::utils::validation::{validate_long_url, validate_short_url};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLink {
    #[validate(length(min = 2, max = 50))]
    pub title: String,
    #[validate(custom(function = "validate_short_url"))]
    pub short_url: String,
    #[validate(custom(function = "validate_long_url"))]
    pub long_url: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Full replacement of the editable fields of a link.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateLink {
    #[validate(length(min = 2, max = 50))]
    pub title: String,
    #[validate(custom(function = "validate_short_url"))]
    pub short_url: String,
    #[validate(custom(function = "validate_long_url"))]
    pub long_url: String,
    pub is_active: bool,
}

/// Link use cases, always scoped to the owning user.
///
/// Creates and updates commit before their [`LinkEvent`] is published.
/// Deletes publish nothing.
pub struct LinkService<L: LinkRepository> {
    repository: Arc<L>,
    publisher: Option<Arc<dyn EventPublisher<LinkEvent>>>,
}

impl<L: LinkRepository> LinkService<L> {
    /// Creates a new link service.
    pub fn new(repository: Arc<L>, publisher: Option<Arc<dyn EventPublisher<LinkEvent>>>) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Creates a link owned by `user_id`.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a bad title, slug or target URL
    /// - [`AppError::NotFound`] if the owner no longer exists
    /// - [`AppError::Conflict`] if `short_url` is taken
    /// - [`AppError::Persistence`] if the commit fails
    /// - [`AppError::EventPublish`] if the link was stored but its event was not sent
    pub async fn create(&self, user_id: &str, request: CreateLink) -> Result<Link, AppError> {
        request.validate()?;

        let mut tx = self.repository.begin().await?;

        if !tx.user_exists(user_id).await? {
            return Err(AppError::not_found(
                "User not found",
                json!({ "id": user_id }),
            ));
        }

        let link = Link::create(
            NewLink {
                user_id: user_id.to_string(),
                title: request.title,
                short_url: request.short_url,
                long_url: request.long_url,
                is_active: request.is_active,
            },
            now_ms(),
        );
        tx.insert(&link).await?;

        let committed = Committed::new(link, tx.commit().await?);
        tracing::info!(
            link_id = %committed.get().id,
            user_id = %user_id,
            short_url = %committed.get().short_url,
            "Link created"
        );

        self.publish(&committed).await?;
        Ok(committed.into_inner())
    }

    /// Returns one of the caller's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or belongs to
    /// another user.
    pub async fn get(&self, user_id: &str, link_id: &str) -> Result<Link, AppError> {
        self.repository
            .find_by_id_and_user(link_id, user_id)
            .await?
            .ok_or_else(|| link_not_found(link_id))
    }

    /// Lists the caller's links, newest first.
    pub async fn list(&self, user_id: &str, active_only: bool) -> Result<Vec<Link>, AppError> {
        self.repository.list_by_user(user_id, active_only).await
    }

    /// Replaces the editable fields of one of the caller's links.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`], with [`AppError::NotFound`] for a missing or
    /// foreign link.
    pub async fn update(
        &self,
        user_id: &str,
        link_id: &str,
        request: UpdateLink,
    ) -> Result<Link, AppError> {
        request.validate()?;

        let mut tx = self.repository.begin().await?;
        let mut link = tx
            .find_by_id_and_user(link_id, user_id)
            .await?
            .ok_or_else(|| link_not_found(link_id))?;

        link.apply(
            LinkChanges {
                title: request.title,
                short_url: request.short_url,
                long_url: request.long_url,
                is_active: request.is_active,
            },
            now_ms(),
        );
        tx.update(&link).await?;

        let committed = Committed::new(link, tx.commit().await?);
        tracing::info!(link_id = %link_id, user_id = %user_id, "Link updated");

        self.publish(&committed).await?;
        Ok(committed.into_inner())
    }

    /// Deletes one of the caller's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for a missing or foreign link.
    pub async fn delete(&self, user_id: &str, link_id: &str) -> Result<(), AppError> {
        let mut tx = self.repository.begin().await?;

        if tx.find_by_id_and_user(link_id, user_id).await?.is_none() {
            return Err(link_not_found(link_id));
        }
        if !tx.delete(link_id).await? {
            return Err(link_not_found(link_id));
        }

        tx.commit().await?;
        tracing::info!(link_id = %link_id, user_id = %user_id, "Link deleted");
        Ok(())
    }

    async fn publish(&self, committed: &Committed<Link>) -> Result<(), AppError> {
        publish_committed::<Link, LinkEvent>(self.publisher.as_deref(), committed).await
    }
}

fn link_not_found(link_id: &str) -> AppError {
    AppError::not_found("Link not found", json!({ "link_id": link_id }))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
