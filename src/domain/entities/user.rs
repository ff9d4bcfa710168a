//! User entity.

/// A registered user.
///
/// `id` is the login name chosen at registration. `password` holds an Argon2
/// PHC string, never the raw password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub password: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn new(id: String, name: String, password_hash: String, now_ms: i64) -> Self {
        Self {
            id,
            name,
            password: password_hash,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}
