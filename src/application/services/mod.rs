//! Business logic services for the application layer.
//!
//! Mutating use cases follow one ordering: validate, open a transaction,
//! write, commit, then publish the event built from the committed entity.

pub mod auth_service;
pub mod link_service;
pub mod publishing;
pub mod user_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth_service::AuthService;
pub use link_service::{CreateLink, LinkService, UpdateLink};
pub use publishing::publish_committed;
pub use user_service::{LoggedIn, LoginUser, RegisterUser, UpdateUser, UserService};
