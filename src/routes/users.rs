// SPDX-License-Identifier: MIT

//! User registration routes.

use axum::{extract::State, response::Response, routing::post, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{ErrorKind, Result};
use crate::extract::AppJson;
use crate::response;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/signup", post(signup))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 30))]
    username: String,
    #[validate(length(min = 8, max = 100))]
    password: String,
    #[validate(length(min = 1, max = 30))]
    nickname: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupResponse {
    user_id: i64,
    username: Option<String>,
    nickname: Option<String>,
    role: String,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<Response> {
    request
        .validate()
        .map_err(|_| ErrorKind::BindingError)?;

    let user = state.auth.signup(
        &request.username,
        &request.password,
        request.nickname.as_deref(),
    )?;

    Ok(response::with_status(
        axum::http::StatusCode::CREATED,
        SignupResponse {
            user_id: user.id,
            username: user.username,
            nickname: user.nickname,
            role: user.role.as_str().to_string(),
        },
    ))
}
