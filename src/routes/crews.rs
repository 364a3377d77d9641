// SPDX-License-Identifier: MIT

//! Crew routes: creation, partial update, deletion, applications, host
//! decisions, detail view and the filtered search.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Router};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::crews::{CrewFilter, ParticipantWithUser};
use crate::error::{ErrorKind, Result};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::auth::CurrentUser;
use crate::models::crew::{Crew, CrewStatus, SafetyLevel};
use crate::models::page::Page;
use crate::response;
use crate::services::crew::{CreateCrew, CrewSearch, SortDirection, SortType, UpdateCrew};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/crews", post(create).get(search))
        .route("/api/crews/all", get(all))
        .route("/api/crews/{id}", get(detail).patch(update).delete(remove))
        .route("/api/crews/{id}/apply", post(apply))
        .route(
            "/api/crews/{id}/participants/{user_id}/approve",
            post(decide),
        )
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCrewRequest {
    #[validate(length(min = 1, max = 100))]
    title: String,
    #[validate(length(max = 1000))]
    description: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    max_participants: i64,
    route_id: Option<String>,
    start_location: Option<String>,
    pace: Option<String>,
    start_time: Option<NaiveDateTime>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CrewResponse {
    id: i64,
    title: String,
    description: Option<String>,
    status: CrewStatus,
    host_id: i64,
    max_participants: i64,
    route_id: String,
    route_type: String,
    distance_km: f64,
    safety_score: i64,
    safety_level: SafetyLevel,
    duration_min: i64,
    start_location: Option<String>,
    pace: Option<String>,
    start_time: Option<NaiveDateTime>,
    waypoints: Vec<String>,
    tags: Vec<String>,
    created_at: NaiveDateTime,
    modified_at: NaiveDateTime,
}

impl From<Crew> for CrewResponse {
    fn from(crew: Crew) -> Self {
        Self {
            id: crew.id,
            title: crew.title,
            description: crew.description,
            status: crew.status,
            host_id: crew.host_id,
            max_participants: crew.max_participants,
            route_id: crew.route_id,
            route_type: crew.route_type,
            distance_km: crew.distance_km,
            safety_score: crew.safety_score,
            safety_level: crew.safety_level,
            duration_min: crew.duration_min,
            start_location: crew.start_location,
            pace: crew.pace,
            start_time: crew.start_time,
            waypoints: crew.waypoints,
            tags: crew.tags,
            created_at: crew.created_at,
            modified_at: crew.modified_at,
        }
    }
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(request): AppJson<CreateCrewRequest>,
) -> Result<Response> {
    request.validate().map_err(|_| ErrorKind::BindingError)?;

    let crew = state
        .crews
        .create(
            &user,
            CreateCrew {
                title: request.title,
                description: request.description,
                max_participants: request.max_participants,
                route_id: request.route_id,
                start_location: request.start_location,
                pace: request.pace,
                start_time: request.start_time,
                tags: request.tags,
            },
        )
        .await?;

    Ok(response::with_status(
        StatusCode::CREATED,
        CrewResponse::from(crew),
    ))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCrewRequest {
    #[validate(length(min = 1, max = 100))]
    title: Option<String>,
    #[validate(length(max = 1000))]
    description: Option<String>,
    status: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    max_participants: Option<i64>,
    start_location: Option<String>,
    pace: Option<String>,
    start_time: Option<NaiveDateTime>,
    waypoints: Option<Vec<String>>,
    tags: Option<Vec<String>>,
}

async fn update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(crew_id): AppPath<i64>,
    AppJson(request): AppJson<UpdateCrewRequest>,
) -> Result<Response> {
    request.validate().map_err(|_| ErrorKind::BindingError)?;

    let status = match request.status.as_deref() {
        None => None,
        Some(raw) => Some(CrewStatus::parse(raw).ok_or(ErrorKind::BindingError)?),
    };

    let crew = state.crews.update(
        &user,
        crew_id,
        UpdateCrew {
            title: request.title,
            description: request.description,
            status,
            max_participants: request.max_participants,
            start_location: request.start_location,
            pace: request.pace,
            start_time: request.start_time,
            waypoints: request.waypoints,
            tags: request.tags,
        },
    )?;

    Ok(response::ok(CrewResponse::from(crew)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(crew_id): AppPath<i64>,
) -> Result<Response> {
    state.crews.delete(&user, crew_id)?;
    Ok(response::ok(()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantResponse {
    user_id: i64,
    username: Option<String>,
    nickname: Option<String>,
    status: crate::models::crew::ParticipantStatus,
    applied_at: NaiveDateTime,
}

impl From<ParticipantWithUser> for ParticipantResponse {
    fn from(row: ParticipantWithUser) -> Self {
        Self {
            user_id: row.participant.user_id,
            username: row.username,
            nickname: row.nickname,
            status: row.participant.status,
            applied_at: row.participant.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CrewDetailResponse {
    #[serde(flatten)]
    crew: CrewResponse,
    current_participants: i64,
    participants: Vec<ParticipantResponse>,
}

async fn detail(State(state): State<Arc<AppState>>, AppPath(crew_id): AppPath<i64>) -> Result<Response> {
    let detail = state.crews.detail(crew_id)?;

    Ok(response::ok(CrewDetailResponse {
        crew: CrewResponse::from(detail.crew),
        current_participants: detail.current_participants,
        participants: detail
            .participants
            .into_iter()
            .map(ParticipantResponse::from)
            .collect(),
    }))
}

async fn apply(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(crew_id): AppPath<i64>,
) -> Result<Response> {
    let participant = state.crews.apply(&user, crew_id)?;

    Ok(response::with_status(
        StatusCode::CREATED,
        ParticipantResponse {
            user_id: participant.user_id,
            username: user.username,
            nickname: user.nickname,
            status: participant.status,
            applied_at: participant.created_at,
        },
    ))
}

#[derive(Deserialize)]
pub struct DecideRequest {
    approve: bool,
}

async fn decide(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath((crew_id, applicant_id)): AppPath<(i64, i64)>,
    AppJson(request): AppJson<DecideRequest>,
) -> Result<Response> {
    let participant = state
        .crews
        .decide(&user, crew_id, applicant_id, request.approve)?;

    Ok(response::ok(serde_json::json!({
        "userId": participant.user_id,
        "status": participant.status,
    })))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    keyword: Option<String>,
    start_location: Option<String>,
    status: Option<String>,
    safety_level: Option<String>,
    /// Comma-separated tag list; a crew matches if any tag intersects
    tags: Option<String>,
    max_distance: Option<f64>,
    min_pace: Option<String>,
    start_time_from: Option<NaiveDateTime>,
    sort_type: Option<String>,
    sort_direction: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CrewPageResponse {
    crews: Vec<CrewResponse>,
    current_page: u32,
    total_pages: u32,
    total_elements: u64,
    size: u32,
    has_next: bool,
    has_previous: bool,
    is_first: bool,
    is_last: bool,
}

impl From<Page<Crew>> for CrewPageResponse {
    fn from(page: Page<Crew>) -> Self {
        Self {
            current_page: page.page,
            total_pages: page.total_pages,
            total_elements: page.total_elements,
            size: page.size,
            has_next: page.has_next,
            has_previous: page.has_previous,
            is_first: page.first,
            is_last: page.last,
            crews: page.content.into_iter().map(CrewResponse::from).collect(),
        }
    }
}

async fn search(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SearchParams>,
) -> Result<Response> {
    let request = decode_search(params)?;
    let page = state.crews.search(&request)?;
    Ok(response::ok(CrewPageResponse::from(page)))
}

async fn all(State(state): State<Arc<AppState>>) -> Result<Response> {
    let crews = state.crews.all()?;
    Ok(response::ok(
        crews.into_iter().map(CrewResponse::from).collect::<Vec<_>>(),
    ))
}

fn decode_search(params: SearchParams) -> Result<CrewSearch> {
    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => Some(CrewStatus::parse(raw).ok_or(ErrorKind::BindingError)?),
    };
    let safety_level = match params.safety_level.as_deref() {
        None => None,
        Some(raw) => Some(SafetyLevel::parse(raw).ok_or(ErrorKind::BindingError)?),
    };
    let sort = match params.sort_type.as_deref() {
        None => SortType::default(),
        Some(raw) => SortType::parse(raw).ok_or(ErrorKind::BindingError)?,
    };
    let direction = match params.sort_direction.as_deref() {
        None => None,
        Some(raw) => Some(SortDirection::parse(raw).ok_or(ErrorKind::BindingError)?),
    };

    let tags = params
        .tags
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(CrewSearch {
        filter: CrewFilter {
            keyword: params.keyword.filter(|k| !k.is_empty()),
            start_location: params.start_location.filter(|l| !l.is_empty()),
            status,
            safety_level,
            tags,
            max_distance: params.max_distance,
            start_time_from: params.start_time_from,
        },
        min_pace: params.min_pace.filter(|p| !p.is_empty()),
        sort,
        direction,
        page: params.page.unwrap_or(0),
        size: params.size.unwrap_or(20).clamp(1, 100),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_search_defaults() {
        let request = decode_search(SearchParams::default()).unwrap();
        assert_eq!(request.page, 0);
        assert_eq!(request.size, 20);
        assert_eq!(request.sort, SortType::Latest);
        assert!(request.filter.tags.is_empty());
    }

    #[test]
    fn test_decode_search_tags_split_and_trimmed() {
        let params = SearchParams {
            tags: Some("night, riverside,,beginner ".to_string()),
            ..Default::default()
        };
        let request = decode_search(params).unwrap();
        assert_eq!(request.filter.tags, vec!["night", "riverside", "beginner"]);
    }

    #[test]
    fn test_decode_search_rejects_unknown_enum_values() {
        let params = SearchParams {
            status: Some("DRAFT".to_string()),
            ..Default::default()
        };
        assert!(decode_search(params).is_err());

        let params = SearchParams {
            sort_type: Some("hottest".to_string()),
            ..Default::default()
        };
        assert!(decode_search(params).is_err());
    }

    #[test]
    fn test_decode_search_caps_page_size() {
        let params = SearchParams {
            size: Some(10_000),
            ..Default::default()
        };
        assert_eq!(decode_search(params).unwrap().size, 100);
    }
}
