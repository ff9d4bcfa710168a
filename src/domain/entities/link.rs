//! Link entity representing a user's shortened URL.

/// A short link owned by a user.
///
/// Timestamps are epoch milliseconds, the same unit carried by [`crate::domain::events::LinkEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub short_url: String,
    pub long_url: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub user_id: String,
    pub title: String,
    pub short_url: String,
    pub long_url: String,
    pub is_active: bool,
}

/// Full replacement of the editable fields of a link.
#[derive(Debug, Clone)]
pub struct LinkChanges {
    pub title: String,
    pub short_url: String,
    pub long_url: String,
    pub is_active: bool,
}

impl Link {
    /// Builds a fresh link with a random UUID and both timestamps set to `now_ms`.
    pub fn create(new_link: NewLink, now_ms: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new_link.user_id,
            title: new_link.title,
            short_url: new_link.short_url,
            long_url: new_link.long_url,
            is_active: new_link.is_active,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Applies `changes` and bumps `updated_at`.
    pub fn apply(&mut self, changes: LinkChanges, now_ms: i64) {
        self.title = changes.title;
        self.short_url = changes.short_url;
        self.long_url = changes.long_url;
        self.is_active = changes.is_active;
        self.updated_at = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_link() -> NewLink {
        NewLink {
            user_id: "khannedy".to_string(),
            title: "Test Link".to_string(),
            short_url: "test123".to_string(),
            long_url: "https://example.com".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_create_assigns_uuid_and_timestamps() {
        let link = Link::create(new_link(), 1_700_000_000_000);

        assert!(uuid::Uuid::parse_str(&link.id).is_ok());
        assert_eq!(link.user_id, "khannedy");
        assert_eq!(link.created_at, 1_700_000_000_000);
        assert_eq!(link.updated_at, link.created_at);
    }

    #[test]
    fn test_create_ids_are_unique() {
        let a = Link::create(new_link(), 0);
        let b = Link::create(new_link(), 0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_apply_keeps_identity_and_created_at() {
        let mut link = Link::create(new_link(), 100);
        let id = link.id.clone();

        link.apply(
            LinkChanges {
                title: "Renamed".to_string(),
                short_url: "renamed".to_string(),
                long_url: "https://rust-lang.org".to_string(),
                is_active: false,
            },
            200,
        );

        assert_eq!(link.id, id);
        assert_eq!(link.title, "Renamed");
        assert!(!link.is_active);
        assert_eq!(link.created_at, 100);
        assert_eq!(link.updated_at, 200);
    }
}
