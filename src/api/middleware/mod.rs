//! HTTP middleware for authentication and request tracing.

pub mod auth;
pub mod tracing;

pub use auth::AuthUser;
