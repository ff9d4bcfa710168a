//! Shared application state injected into HTTP handlers.

use rdkafka::producer::FutureProducer;
use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{AuthService, LinkService, UserService};
use crate::infrastructure::persistence::{PgLinkRepository, PgUserRepository};

/// Cloned into every request; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<PgUserRepository>>,
    pub link_service: Arc<LinkService<PgLinkRepository>>,
    pub auth_service: Arc<AuthService>,
    pub pool: Arc<PgPool>,
    /// Present only when event publishing is enabled. Used by the health check.
    pub producer: Option<FutureProducer>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService<PgUserRepository>>,
        link_service: Arc<LinkService<PgLinkRepository>>,
        auth_service: Arc<AuthService>,
        pool: Arc<PgPool>,
        producer: Option<FutureProducer>,
    ) -> Self {
        Self {
            user_service,
            link_service,
            auth_service,
            pool,
            producer,
        }
    }
}
