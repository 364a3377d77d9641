// SPDX-License-Identifier: MIT

//! Hazard report routes. Anyone authenticated can file and list reports;
//! status changes are admin-only and deletion belongs to the reporter
//! while the report is still OPEN.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{middleware, Extension, Router};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{ErrorKind, Result};
use crate::extract::{AppJson, AppPath};
use crate::middleware::auth::{require_admin, CurrentUser};
use crate::models::report::{Report, ReportStatus, TargetType};
use crate::response;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/api/hazards/{id}/status", patch(change_status))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/api/hazards", post(create))
        .route("/api/hazards/all", get(all))
        .route("/api/hazards/me", get(mine))
        .route("/api/hazards/{id}", get(detail).delete(remove))
        .merge(admin)
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    target_type: String,
    target_id: i64,
    #[validate(length(min = 1, max = 1000))]
    reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    id: i64,
    target_type: TargetType,
    target_id: i64,
    reporter_id: i64,
    reason: String,
    status: ReportStatus,
    created_at: NaiveDateTime,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            target_type: report.target_type,
            target_id: report.target_id,
            reporter_id: report.reporter_id,
            reason: report.reason,
            status: report.status,
            created_at: report.created_at,
        }
    }
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(request): AppJson<CreateReportRequest>,
) -> Result<Response> {
    request.validate().map_err(|_| ErrorKind::BindingError)?;
    let target_type =
        TargetType::parse(&request.target_type).ok_or(ErrorKind::BindingError)?;

    let report = state
        .db
        .insert_report(target_type, request.target_id, user.id, &request.reason)?;

    Ok(response::with_status(
        StatusCode::CREATED,
        ReportResponse::from(report),
    ))
}

async fn all(State(state): State<Arc<AppState>>) -> Result<Response> {
    let reports = state.db.all_reports()?;
    Ok(response::ok(
        reports
            .into_iter()
            .map(ReportResponse::from)
            .collect::<Vec<_>>(),
    ))
}

async fn mine(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    let reports = state.db.reports_for_user(user.id)?;
    Ok(response::ok(
        reports
            .into_iter()
            .map(ReportResponse::from)
            .collect::<Vec<_>>(),
    ))
}

async fn detail(State(state): State<Arc<AppState>>, AppPath(id): AppPath<i64>) -> Result<Response> {
    let report = state.db.get_report(id)?.ok_or(ErrorKind::ReportNotFound)?;
    Ok(response::ok(ReportResponse::from(report)))
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    status: String,
}

/// Admin decision on a report. A report leaves OPEN exactly once.
async fn change_status(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<ChangeStatusRequest>,
) -> Result<Response> {
    let status = ReportStatus::parse(&request.status).ok_or(ErrorKind::BindingError)?;
    if status == ReportStatus::Open {
        return Err(ErrorKind::BindingError.into());
    }

    let report = state.db.get_report(id)?.ok_or(ErrorKind::ReportNotFound)?;
    if !report.is_open() {
        return Err(ErrorKind::ReportAlreadyProcessed.into());
    }

    state.db.update_report_status(id, status)?;

    let mut updated = report;
    updated.status = status;
    Ok(response::ok(ReportResponse::from(updated)))
}

/// Reporters may withdraw their own report while it is still OPEN.
async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<i64>,
) -> Result<Response> {
    let report = state.db.get_report(id)?.ok_or(ErrorKind::ReportNotFound)?;

    if !report.is_reporter(user.id) {
        return Err(ErrorKind::ReportAccessDenied.into());
    }
    if !report.is_open() {
        return Err(ErrorKind::ReportAlreadyProcessed.into());
    }

    state.db.delete_report(id)?;
    Ok(response::ok(()))
}
