//! DTOs for user endpoints.

use serde::Serialize;

use crate::application::services::LoggedIn;
use crate::domain::entities::User;

/// Public view of an account. The password hash is never serialized.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    /// Only set in the login response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            token: None,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<LoggedIn> for UserResponse {
    fn from(logged_in: LoggedIn) -> Self {
        Self {
            token: Some(logged_in.token),
            ..Self::from(logged_in.user)
        }
    }
}
