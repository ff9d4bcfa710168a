//! DTOs for link endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::entities::Link;

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub short_url: String,
    pub long_url: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            user_id: link.user_id,
            title: link.title,
            short_url: link.short_url,
            long_url: link.long_url,
            is_active: link.is_active,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// Query string of `GET /api/links`.
#[derive(Debug, Default, Deserialize)]
pub struct ListLinksQuery {
    /// `true` restricts the list to active links.
    #[serde(default)]
    pub active: Option<bool>,
}
