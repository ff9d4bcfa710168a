//! Handlers for link management endpoints.
//!
//! Every route is scoped to the authenticated caller: a link owned by another
//! user is reported as missing.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::api::dto::WebResponse;
use crate::api::dto::link::{LinkResponse, ListLinksQuery};
use crate::api::middleware::AuthUser;
use crate::application::services::{CreateLink, UpdateLink};
use crate::error::AppError;
use crate::state::AppState;

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links?active=true`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<ListLinksQuery>,
) -> Result<Json<WebResponse<Vec<LinkResponse>>>, AppError> {
    let active_only = query.active.unwrap_or(false);
    let links = state.link_service.list(&user_id, active_only).await?;

    Ok(Json(WebResponse::new(
        links.into_iter().map(LinkResponse::from).collect(),
    )))
}

/// Creates a link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Rust Book",
///   "short_url": "rust-book",
///   "long_url": "https://doc.rust-lang.org/book/",
///   "is_active": true
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request on validation failure
/// - 409 Conflict if `short_url` is taken
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateLink>,
) -> Result<Json<WebResponse<LinkResponse>>, AppError> {
    let link = state.link_service.create(&user_id, payload).await?;
    Ok(Json(WebResponse::new(link.into())))
}

/// `GET /api/links/{link_id}`
pub async fn get_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(link_id): Path<String>,
) -> Result<Json<WebResponse<LinkResponse>>, AppError> {
    let link = state.link_service.get(&user_id, &link_id).await?;
    Ok(Json(WebResponse::new(link.into())))
}

/// Replaces the editable fields of a link.
///
/// `PATCH /api/links/{link_id}`
pub async fn update_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(link_id): Path<String>,
    Json(payload): Json<UpdateLink>,
) -> Result<Json<WebResponse<LinkResponse>>, AppError> {
    let link = state
        .link_service
        .update(&user_id, &link_id, payload)
        .await?;
    Ok(Json(WebResponse::new(link.into())))
}

/// Deletes a link. No event is published for deletions.
///
/// `DELETE /api/links/{link_id}`
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(link_id): Path<String>,
) -> Result<Json<WebResponse<bool>>, AppError> {
    state.link_service.delete(&user_id, &link_id).await?;
    Ok(Json(WebResponse::new(true)))
}
