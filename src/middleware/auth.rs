// SPDX-License-Identifier: MIT

//! JWT authentication middleware.
//!
//! Protected routes require a Bearer access token; the verified user is
//! loaded from the database and handed to handlers as a request extension.
//! Refresh tokens never pass this gate, they only reach the refresh
//! endpoints.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::{AppError, ErrorKind};
use crate::models::user::User;
use crate::AppState;

/// Authenticated user for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(ErrorKind::UnauthorizedUser)?;

    let user = state.auth.authenticate(&token)?;
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Middleware for admin-only routes; layered after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let authorized = request
        .extensions()
        .get::<CurrentUser>()
        .map(|current| current.0.role.is_admin())
        .unwrap_or(false);

    if !authorized {
        return Err(ErrorKind::AccessDenied.into());
    }
    Ok(next.run(request).await)
}

pub(crate) fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}
