// SPDX-License-Identifier: MIT

//! Crew search over HTTP: filter predicates, sorting and page metadata.

mod common;

use axum::http::StatusCode;
use common::*;
use crewrun::models::crew::{Crew, CrewStatus, SafetyLevel};
use crewrun::models::user::Role;
use crewrun::AppState;

fn seed_crew(state: &AppState, host_id: i64, title: &str) -> Crew {
    let now = chrono::Utc::now().naive_utc();
    let crew = Crew {
        id: 0,
        title: title.to_string(),
        description: None,
        status: CrewStatus::Open,
        host_id,
        max_participants: 10,
        route_id: format!("route-{title}"),
        route_type: "safe".to_string(),
        distance_km: 5.0,
        safety_score: 85,
        safety_level: SafetyLevel::Safe,
        duration_min: 30,
        start_location: Some("Riverside park".to_string()),
        pace: Some("6'00\"/km".to_string()),
        start_time: None,
        waypoints: vec!["35.86,128.60".to_string()],
        tags: vec!["beginner".to_string()],
        created_at: now,
        modified_at: now,
    };
    state.db.insert_crew(crew).unwrap()
}

#[tokio::test]
async fn test_keyword_and_status_filters() {
    let (app, state) = create_test_app();
    let (host_id, access, _) = seed_user(&state, "host", Role::User);

    seed_crew(&state, host_id, "Morning jog");
    let mut closed = seed_crew(&state, host_id, "Evening jog");
    closed.update_status(CrewStatus::Closed);
    state.db.update_crew(&closed).unwrap();
    seed_crew(&state, host_id, "Track intervals");

    let response = request(
        &app,
        "GET",
        "/api/crews?keyword=jog&status=OPEN",
        Some(&access),
        None,
    )
    .await;
    let page = expect_data(response, StatusCode::OK).await;
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["crews"][0]["title"], "Morning jog");
}

#[tokio::test]
async fn test_min_pace_filter_is_numeric() {
    let (app, state) = create_test_app();
    let (host_id, access, _) = seed_user(&state, "host", Role::User);

    let mut fast = seed_crew(&state, host_id, "Fast");
    fast.update_pace("5'30\"/km".to_string());
    state.db.update_crew(&fast).unwrap();
    seed_crew(&state, host_id, "Easy"); // 6'00"/km

    // minPace=5'45"/km, URL-encoded; only the 5'30" crew is at least that fast
    let response = request(
        &app,
        "GET",
        "/api/crews?minPace=5%2745%22%2Fkm",
        Some(&access),
        None,
    )
    .await;
    let page = expect_data(response, StatusCode::OK).await;
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["crews"][0]["title"], "Fast");
}

#[tokio::test]
async fn test_tag_and_distance_filters() {
    let (app, state) = create_test_app();
    let (host_id, access, _) = seed_user(&state, "host", Role::User);

    let mut long = seed_crew(&state, host_id, "Long trail");
    long.distance_km = 21.1;
    long.update_tags(vec!["trail".to_string()]);
    state.db.update_crew(&long).unwrap();
    seed_crew(&state, host_id, "Park loop"); // 5.0 km, beginner

    let response = request(
        &app,
        "GET",
        "/api/crews?tags=beginner,trail&maxDistance=10",
        Some(&access),
        None,
    )
    .await;
    let page = expect_data(response, StatusCode::OK).await;
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["crews"][0]["title"], "Park loop");
}

#[tokio::test]
async fn test_sort_by_distance_with_direction() {
    let (app, state) = create_test_app();
    let (host_id, access, _) = seed_user(&state, "host", Role::User);

    let mut long = seed_crew(&state, host_id, "Long");
    long.distance_km = 12.0;
    state.db.update_crew(&long).unwrap();
    seed_crew(&state, host_id, "Short");

    // Without an explicit direction every sort reads descending
    let response = request(
        &app,
        "GET",
        "/api/crews?sortType=distance",
        Some(&access),
        None,
    )
    .await;
    let page = expect_data(response, StatusCode::OK).await;
    assert_eq!(page["crews"][0]["title"], "Long");

    let response = request(
        &app,
        "GET",
        "/api/crews?sortType=distance&sortDirection=asc",
        Some(&access),
        None,
    )
    .await;
    let page = expect_data(response, StatusCode::OK).await;
    assert_eq!(page["crews"][0]["title"], "Short");
}

#[tokio::test]
async fn test_page_metadata_flags() {
    let (app, state) = create_test_app();
    let (host_id, access, _) = seed_user(&state, "host", Role::User);

    for i in 0..25 {
        seed_crew(&state, host_id, &format!("Crew {i}"));
    }

    let response = request(&app, "GET", "/api/crews?page=0&size=10", Some(&access), None).await;
    let page = expect_data(response, StatusCode::OK).await;
    assert_eq!(page["totalElements"], 25);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["crews"].as_array().unwrap().len(), 10);
    assert_eq!(page["hasNext"], true);
    assert_eq!(page["hasPrevious"], false);
    assert_eq!(page["isFirst"], true);
    assert_eq!(page["isLast"], false);

    let response = request(&app, "GET", "/api/crews?page=2&size=10", Some(&access), None).await;
    let page = expect_data(response, StatusCode::OK).await;
    assert_eq!(page["crews"].as_array().unwrap().len(), 5);
    assert_eq!(page["hasNext"], false);
    assert_eq!(page["isLast"], true);

    // Out of range pages are empty, not an error
    let response = request(&app, "GET", "/api/crews?page=9&size=10", Some(&access), None).await;
    let page = expect_data(response, StatusCode::OK).await;
    assert!(page["crews"].as_array().unwrap().is_empty());
    assert_eq!(page["totalElements"], 25);
}

#[tokio::test]
async fn test_bad_filter_values_are_binding_errors() {
    let (app, state) = create_test_app();
    let (_, access, _) = seed_user(&state, "host", Role::User);

    let response = request(
        &app,
        "GET",
        "/api/crews?status=DRAFT",
        Some(&access),
        None,
    )
    .await;
    expect_error(response, StatusCode::BAD_REQUEST, "C002").await;
}

#[tokio::test]
async fn test_method_not_allowed_speaks_the_envelope() {
    let (app, state) = create_test_app();
    let (_, access, _) = seed_user(&state, "host", Role::User);

    let response = request(&app, "PUT", "/api/crews", Some(&access), None).await;
    expect_error(response, StatusCode::METHOD_NOT_ALLOWED, "C015").await;
}
