//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::{error::AppError, state::AppState};

/// Id of the authenticated caller, inserted as a request extension by [`layer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

/// Authenticates requests using a JWT from the `Authorization` header.
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// On success the token subject is attached as [`AuthUser`]. A missing header,
/// a malformed token, a bad signature or an expired token all produce
/// `401 Unauthorized` with `WWW-Authenticate: Bearer`.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    let user_id = st.auth_service.verify_token(&token)?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(AuthUser(user_id));

    Ok(next.run(req).await)
}
