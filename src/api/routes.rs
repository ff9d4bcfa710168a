//! API route configuration.
//!
//! Account creation, login and health are public; everything else requires a
//! bearer token via [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_link_handler, current_handler, delete_link_handler, get_link_handler, health_handler,
    list_links_handler, login_handler, logout_handler, register_handler, update_current_handler,
    update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Routes reachable without a token.
///
/// - `POST /users`        - Register
/// - `POST /users/_login` - Login, returns a JWT
/// - `GET  /health`       - Database and producer status
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_handler))
        .route("/users/_login", post(login_handler))
        .route("/health", get(health_handler))
}

/// Routes protected by bearer token authentication.
///
/// # Endpoints
///
/// - `GET    /users/_current`   - Current user
/// - `PATCH  /users/_current`   - Update name/password
/// - `DELETE /users`            - Logout
/// - `GET    /links`            - List own links (`?active=true`)
/// - `POST   /links`            - Create a link
/// - `GET    /links/{link_id}`  - Get own link
/// - `PATCH  /links/{link_id}`  - Update own link
/// - `DELETE /links/{link_id}`  - Delete own link
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/_current",
            get(current_handler).patch(update_current_handler),
        )
        .route("/users", delete(logout_handler))
        .route("/links", get(list_links_handler).post(create_link_handler))
        .route(
            "/links/{link_id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
}
