// SPDX-License-Identifier: MIT

//! Running record and statistics routes.

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
use crate::extract::AppJson;
use crate::middleware::auth::CurrentUser;
use crate::models::running::{pace_for, RunningRecord};
use crate::pace;
use crate::response;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/running", post(create))
        .route("/api/running/stats", get(stats))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    #[validate(range(min = 0.0, max = 1000.0))]
    distance_km: f64,
    #[validate(range(min = 0, max = 100_000))]
    duration_minutes: i64,
    best_pace: Option<String>,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    route_data: Option<String>,
    weather: Option<String>,
    #[validate(length(max = 1000))]
    notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordResponse {
    id: i64,
    distance_km: f64,
    duration_minutes: i64,
    pace: String,
    best_pace: Option<String>,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    weather: Option<String>,
    notes: Option<String>,
    created_at: NaiveDateTime,
}

impl From<RunningRecord> for RecordResponse {
    fn from(record: RunningRecord) -> Self {
        Self {
            id: record.id,
            distance_km: record.distance_km,
            duration_minutes: record.duration_minutes,
            pace: record.pace,
            best_pace: record.best_pace,
            start_time: record.start_time,
            end_time: record.end_time,
            weather: record.weather,
            notes: record.notes,
            created_at: record.created_at,
        }
    }
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(request): AppJson<CreateRecordRequest>,
) -> Result<Response> {
    request.validate().map_err(|_| ErrorKind::BindingError)?;

    let pace_min_per_km = pace_for(request.distance_km, request.duration_minutes);
    let now = chrono::Utc::now().naive_utc();

    let record = RunningRecord {
        id: 0,
        user_id: user.id,
        distance_km: request.distance_km,
        duration_minutes: request.duration_minutes,
        pace_min_per_km,
        pace: pace::format_min_per_km(pace_min_per_km),
        best_pace: request.best_pace,
        start_time: request.start_time,
        end_time: request.end_time,
        route_data: request.route_data,
        weather: request.weather,
        notes: request.notes,
        created_at: now,
    };

    let record = state.db.insert_running_record(record)?;
    Ok(response::with_status(
        StatusCode::CREATED,
        RecordResponse::from(record),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    total_runs: i64,
    total_distance_km: f64,
    total_duration_minutes: i64,
    average_distance_km: f64,
    average_duration_minutes: i64,
    average_pace: String,
    best_pace: String,
    last_run_date: Option<NaiveDateTime>,
    recent_runs: Vec<RecordResponse>,
}

async fn stats(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    let stats = state.db.running_stats(user.id)?;
    let recent = state.db.recent_running_records(user.id, 5)?;

    Ok(response::ok(StatsResponse {
        total_runs: stats.total_runs,
        total_distance_km: stats.total_distance_km,
        total_duration_minutes: stats.total_duration_minutes,
        average_distance_km: stats.average_distance_km(),
        average_duration_minutes: stats.average_duration_minutes(),
        average_pace: stats.average_pace(),
        best_pace: stats.best_pace(),
        last_run_date: stats.last_run_date,
        recent_runs: recent.into_iter().map(RecordResponse::from).collect(),
    }))
}
