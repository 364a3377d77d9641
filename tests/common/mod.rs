// SPDX-License-Identifier: MIT

//! Shared helpers for integration tests: an app wired to an in-memory
//! database, and request/response plumbing.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use crewrun::models::user::Role;
use crewrun::{config::Config, db::Database, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub fn create_test_app() -> (Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Arc::new(Database::open_in_memory().expect("in-memory db"));
    let state = Arc::new(AppState::new(config, db));
    (crewrun::routes::create_router(state.clone()), state)
}

/// Insert a user directly and mint a token pair for them, bypassing the
/// HTTP signup/login flow.
pub fn seed_user(state: &AppState, username: &str, role: Role) -> (i64, String, String) {
    let user_id = state
        .db
        .create_local_user(username, "unused-hash", Some(username), role)
        .expect("seed user");
    let pair = state.auth.issue_for(user_id, None).expect("token pair");
    (user_id, pair.access_token, pair.refresh_token)
}

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the failure envelope and return it.
pub async fn expect_error(response: Response<Body>, status: StatusCode, code: &str) -> Value {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], code);
    body
}

/// Assert the success envelope and return its `data`.
pub async fn expect_data(response: Response<Body>, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    body["data"].clone()
}
