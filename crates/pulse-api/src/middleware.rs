use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use pulse_types::models::{Role, User};

use crate::auth::{self, AppState};
use crate::error::ApiError;

/// The authenticated user, inserted into request extensions by
/// `require_auth` and read back by handlers and `require_admin`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extracts the bearer token, resolves it to a user and stores the public
/// projection in the request. 401 on any failure.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".to_string()))?;

    let user = auth::resolve_token(&state, token)?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Second stage of the gate: must run inside `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".to_string()))?;

    if user.0.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Not authorized as an admin".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
