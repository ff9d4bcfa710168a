//! Handlers for account endpoints (register, login, current user, logout).

use axum::{Extension, Json, extract::State};

use crate::api::dto::WebResponse;
use crate::api::dto::user::UserResponse;
use crate::api::middleware::AuthUser;
use crate::application::services::{LoginUser, RegisterUser, UpdateUser};
use crate::error::AppError;
use crate::state::AppState;

/// Registers a new account.
///
/// # Endpoint
///
/// `POST /api/users`
///
/// # Request Body
///
/// ```json
/// { "id": "khannedy", "password": "rahasia", "name": "Eko Khannedy" }
/// ```
///
/// # Errors
///
/// - 400 Bad Request on validation failure
/// - 409 Conflict if the id is taken
/// - 500 `event_publish_error` if the account was stored but its event was not sent
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<Json<WebResponse<UserResponse>>, AppError> {
    let user = state.user_service.register(payload).await?;
    Ok(Json(WebResponse::new(user.into())))
}

/// Exchanges credentials for a bearer token.
///
/// `POST /api/users/_login`. Unknown ids and wrong passwords both return 401.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginUser>,
) -> Result<Json<WebResponse<UserResponse>>, AppError> {
    let logged_in = state.user_service.login(payload).await?;
    Ok(Json(WebResponse::new(logged_in.into())))
}

/// `GET /api/users/_current`
pub async fn current_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<WebResponse<UserResponse>>, AppError> {
    let user = state.user_service.current(&user_id).await?;
    Ok(Json(WebResponse::new(user.into())))
}

/// Updates the caller's name and/or password.
///
/// `PATCH /api/users/_current`. Absent or empty fields are left unchanged.
pub async fn update_current_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<WebResponse<UserResponse>>, AppError> {
    let user = state.user_service.update(&user_id, payload).await?;
    Ok(Json(WebResponse::new(user.into())))
}

/// `DELETE /api/users`
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Json<WebResponse<bool>> {
    Json(WebResponse::new(state.user_service.logout(&user_id)))
}
