//! Registration, login and profile updates.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::auth_service::{AuthService, invalid_credentials};
use super::publishing::publish_committed;
use crate::domain::entities::User;
use crate::domain::events::{Committed, UserEvent};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::infrastructure::messaging::EventPublisher;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(length(min = 1, max = 100))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(length(min = 1, max = 100))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
}

/// Partial profile update. Absent or empty fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub password: Option<String>,
}

/// A user together with a freshly issued access token.
#[derive(Debug, Clone)]
pub struct LoggedIn {
    pub user: User,
    pub token: String,
}

/// User account use cases.
///
/// Every mutation commits before its [`UserEvent`] is published. When
/// `publisher` is `None` events are skipped.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    auth: Arc<AuthService>,
    publisher: Option<Arc<dyn EventPublisher<UserEvent>>>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(
        repository: Arc<R>,
        auth: Arc<AuthService>,
        publisher: Option<Arc<dyn EventPublisher<UserEvent>>>,
    ) -> Self {
        Self {
            repository,
            auth,
            publisher,
        }
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for missing or oversized fields
    /// - [`AppError::Conflict`] if the id is taken
    /// - [`AppError::Persistence`] if the commit fails
    /// - [`AppError::EventPublish`] if the account was stored but its event was not sent
    pub async fn register(&self, request: RegisterUser) -> Result<User, AppError> {
        request.validate()?;

        let mut tx = self.repository.begin().await?;

        if tx.count_by_id(&request.id).await? > 0 {
            tracing::warn!(user_id = %request.id, "User already exists");
            return Err(AppError::conflict(
                "User already exists",
                json!({ "id": request.id }),
            ));
        }

        let password_hash = self.auth.hash_password(&request.password)?;
        let user = User::new(request.id, request.name, password_hash, now_ms());
        tx.insert(&user).await?;

        let committed = Committed::new(user, tx.commit().await?);
        tracing::info!(user_id = %committed.get().id, "User registered");

        self.publish(&committed).await?;
        Ok(committed.into_inner())
    }

    /// Verifies credentials and issues an access token.
    ///
    /// A successful login is announced with a [`UserEvent`] carrying the
    /// unchanged account state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for an unknown id or a wrong password.
    pub async fn login(&self, request: LoginUser) -> Result<LoggedIn, AppError> {
        request.validate()?;

        let mut tx = self.repository.begin().await?;

        let user = tx.find_by_id(&request.id).await?.ok_or_else(|| {
            tracing::warn!(user_id = %request.id, "Login for unknown user");
            invalid_credentials()
        })?;

        self.auth.verify_password(&request.password, &user.password)?;
        let token = self.auth.issue_token(&user.id)?;

        let committed = Committed::new(user, tx.commit().await?);
        self.publish(&committed).await?;

        Ok(LoggedIn {
            user: committed.into_inner(),
            token,
        })
    }

    /// Loads the account behind an authenticated request.
    pub async fn current(&self, user_id: &str) -> Result<User, AppError> {
        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Changes the name and/or password of an account.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for oversized fields
    /// - [`AppError::NotFound`] if the account no longer exists
    /// - [`AppError::Persistence`] / [`AppError::EventPublish`] as for [`Self::register`]
    pub async fn update(&self, user_id: &str, request: UpdateUser) -> Result<User, AppError> {
        request.validate()?;

        let mut tx = self.repository.begin().await?;
        let mut user = tx
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;

        if let Some(name) = request.name.filter(|n| !n.is_empty()) {
            user.name = name;
        }
        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            user.password = self.auth.hash_password(&password)?;
        }
        user.updated_at = now_ms();

        tx.update(&user).await?;

        let committed = Committed::new(user, tx.commit().await?);
        tracing::info!(user_id = %user_id, "User updated");

        self.publish(&committed).await?;
        Ok(committed.into_inner())
    }

    /// Tokens are stateless, so logging out only asks the client to drop its token.
    pub fn logout(&self, user_id: &str) -> bool {
        tracing::info!(user_id = %user_id, "User logged out");
        true
    }

    async fn publish(&self, committed: &Committed<User>) -> Result<(), AppError> {
        publish_committed::<User, UserEvent>(self.publisher.as_deref(), committed).await
    }
}

fn user_not_found(user_id: &str) -> AppError {
    AppError::not_found("User not found", json!({ "id": user_id }))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
