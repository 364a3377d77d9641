// SPDX-License-Identifier: MIT

//! Login, refresh token rotation and logout routes.
//!
//! Refresh tokens travel either as a Bearer header (mobile clients) or as
//! the HttpOnly `refresh` cookie (browser clients, via the `-cookie`
//! variant). Access tokens are only ever returned in the body.

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    extract::State,
    routing::{delete, post},
    Extension, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{ErrorKind, Result};
use crate::extract::AppJson;
use crate::middleware::auth::CurrentUser;
use crate::response;
use crate::services::auth::TokenPair;
use crate::AppState;

const REFRESH_COOKIE: &str = "refresh";

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/refresh-cookie", post(refresh_cookie))
        .route("/api/auth/logout", delete(logout))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/logout/all", delete(logout_all))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    username: String,
    #[validate(length(min = 1))]
    password: String,
    device_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: &'static str,
    expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in: pair.expires_in,
        }
    }
}

async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Response> {
    request.validate().map_err(|_| ErrorKind::BindingError)?;

    let pair = state.auth.login(
        &request.username,
        &request.password,
        request.device_id.as_deref(),
    )?;
    Ok(response::ok(TokenResponse::from(pair)))
}

/// Rotate the refresh token presented as Bearer header or cookie.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Response> {
    let presented = presented_refresh_token(&headers, &jar)?;
    let pair = state.auth.rotate(&presented)?;
    Ok(response::ok(TokenResponse::from(pair)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenResponse {
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
}

/// Cookie-only rotation for browser clients: the new refresh token goes
/// back out as the HttpOnly cookie and never appears in the body.
async fn refresh_cookie(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(ErrorKind::InvalidRefreshToken)?;

    let pair = state.auth.rotate(&presented)?;

    let jar = jar.add(refresh_cookie_for(
        pair.refresh_token.clone(),
        state.config.refresh_token_ttl_secs,
    ));
    let body = response::ok(AccessTokenResponse {
        access_token: pair.access_token,
        token_type: "Bearer",
        expires_in: pair.expires_in,
    });
    Ok((jar, body).into_response())
}

/// Single-device logout: revoke the presented refresh token and drop the
/// cookie if one was used.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Response> {
    let presented = presented_refresh_token(&headers, &jar)?;
    state.auth.revoke(&presented)?;

    let jar = jar.remove(Cookie::build((REFRESH_COOKIE, "")).path("/api/auth"));
    Ok((jar, response::with_status(StatusCode::OK, ())).into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutAllResponse {
    revoked: usize,
}

/// Global logout for the authenticated user.
async fn logout_all(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<Response> {
    let revoked = state.auth.revoke_all(user.id)?;

    let jar = jar.remove(Cookie::build((REFRESH_COOKIE, "")).path("/api/auth"));
    Ok((jar, response::ok(LogoutAllResponse { revoked })).into_response())
}

fn presented_refresh_token(headers: &HeaderMap, jar: &CookieJar) -> Result<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Ok(token.to_string());
    }

    jar.get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ErrorKind::InvalidRefreshToken.into())
}

fn refresh_cookie_for(token: String, ttl_secs: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .path("/api/auth")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}
