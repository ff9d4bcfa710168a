//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository
//! transactions, validation and event publication. Services consume repository
//! and publisher traits and provide a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::user_service::UserService`] - Registration, login and profile updates
//! - [`services::link_service::LinkService`] - Link CRUD scoped to the owner
//! - [`services::auth_service::AuthService`] - Password hashing and access tokens

pub mod services;
