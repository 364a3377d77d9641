// SPDX-License-Identifier: MIT

//! Favorite route bookmarks. Ownership comes from the session principal;
//! one user can never see or delete another user's favorites.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Router};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{ErrorKind, Result};
use crate::extract::{AppJson, AppPath};
use crate::middleware::auth::CurrentUser;
use crate::models::crew::SafetyLevel;
use crate::models::favorite::Favorite;
use crate::response;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/favorites", post(create).get(list))
        .route("/api/favorites/{id}", get(detail).delete(remove))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFavoriteRequest {
    #[validate(length(min = 1, max = 100))]
    name: String,
    #[serde(default)]
    waypoints: Vec<String>,
    saved_polyline: Option<String>,
    distance_m: Option<i64>,
    duration_s: Option<i64>,
    safety_score: Option<i64>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteResponse {
    id: i64,
    name: String,
    waypoints: Vec<String>,
    saved_polyline: Option<String>,
    distance_m: Option<i64>,
    duration_s: Option<i64>,
    safety_score: Option<i64>,
    safety_level: Option<SafetyLevel>,
    tags: Vec<String>,
    created_at: NaiveDateTime,
}

impl From<Favorite> for FavoriteResponse {
    fn from(favorite: Favorite) -> Self {
        Self {
            id: favorite.id,
            name: favorite.name,
            waypoints: favorite.waypoints,
            saved_polyline: favorite.saved_polyline,
            distance_m: favorite.distance_m,
            duration_s: favorite.duration_s,
            safety_score: favorite.safety_score,
            safety_level: favorite.safety_level,
            tags: favorite.tags,
            created_at: favorite.created_at,
        }
    }
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(request): AppJson<CreateFavoriteRequest>,
) -> Result<Response> {
    request.validate().map_err(|_| ErrorKind::BindingError)?;

    let now = chrono::Utc::now().naive_utc();
    let favorite = Favorite {
        id: 0,
        user_id: user.id,
        name: request.name,
        waypoints: request.waypoints,
        saved_polyline: request.saved_polyline,
        distance_m: request.distance_m,
        duration_s: request.duration_s,
        safety_score: request.safety_score,
        safety_level: request.safety_score.map(SafetyLevel::from_score),
        tags: request.tags,
        created_at: now,
        modified_at: now,
    };

    let favorite = state.db.insert_favorite(favorite)?;
    Ok(response::with_status(
        StatusCode::CREATED,
        FavoriteResponse::from(favorite),
    ))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    let favorites = state.db.favorites_for_user(user.id)?;
    Ok(response::ok(
        favorites
            .into_iter()
            .map(FavoriteResponse::from)
            .collect::<Vec<_>>(),
    ))
}

async fn detail(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<i64>,
) -> Result<Response> {
    let favorite = state
        .db
        .get_favorite(id, user.id)?
        .ok_or(ErrorKind::FavoriteNotFound)?;
    Ok(response::ok(FavoriteResponse::from(favorite)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<i64>,
) -> Result<Response> {
    if !state.db.delete_favorite(id, user.id)? {
        return Err(ErrorKind::FavoriteNotFound.into());
    }
    Ok(response::ok(()))
}
