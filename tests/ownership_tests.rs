// SPDX-License-Identifier: MIT

//! Ownership and role gates on favorites and hazard reports.

mod common;

use axum::http::StatusCode;
use common::*;
use crewrun::models::user::Role;
use serde_json::json;

#[tokio::test]
async fn test_favorites_are_private_to_their_owner() {
    let (app, state) = create_test_app();
    let (_, owner, _) = seed_user(&state, "owner", Role::User);
    let (_, other, _) = seed_user(&state, "other", Role::User);

    let response = request(
        &app,
        "POST",
        "/api/favorites",
        Some(&owner),
        Some(json!({
            "name": "Park loop",
            "waypoints": ["35.86,128.60", "35.87,128.61"],
            "distanceM": 5000,
            "safetyScore": 90,
            "tags": ["park"]
        })),
    )
    .await;
    let favorite = expect_data(response, StatusCode::CREATED).await;
    let id = favorite["id"].as_i64().unwrap();
    // Safety level is derived from the score, never taken from the client
    assert_eq!(favorite["safetyLevel"], "SAFE");

    // The owner sees it
    let response = request(&app, "GET", &format!("/api/favorites/{id}"), Some(&owner), None).await;
    expect_data(response, StatusCode::OK).await;

    // Someone else gets not-found, not forbidden: favorites don't leak
    // their existence
    let response = request(&app, "GET", &format!("/api/favorites/{id}"), Some(&other), None).await;
    expect_error(response, StatusCode::NOT_FOUND, "F001").await;

    let response = request(
        &app,
        "DELETE",
        &format!("/api/favorites/{id}"),
        Some(&other),
        None,
    )
    .await;
    expect_error(response, StatusCode::NOT_FOUND, "F001").await;

    // Listing is scoped per user
    let response = request(&app, "GET", "/api/favorites", Some(&other), None).await;
    let list = expect_data(response, StatusCode::OK).await;
    assert!(list.as_array().unwrap().is_empty());

    let response = request(&app, "DELETE", &format!("/api/favorites/{id}"), Some(&owner), None).await;
    expect_data(response, StatusCode::OK).await;
}

#[tokio::test]
async fn test_report_status_changes_are_admin_only() {
    let (app, state) = create_test_app();
    let (_, reporter, _) = seed_user(&state, "reporter", Role::User);
    let (_, admin, _) = seed_user(&state, "admin", Role::Admin);

    let response = request(
        &app,
        "POST",
        "/api/hazards",
        Some(&reporter),
        Some(json!({"targetType": "HAZARD", "targetId": 7, "reason": "Broken streetlight"})),
    )
    .await;
    let report = expect_data(response, StatusCode::CREATED).await;
    let id = report["id"].as_i64().unwrap();
    assert_eq!(report["status"], "OPEN");

    // A plain user cannot change status
    let response = request(
        &app,
        "PATCH",
        &format!("/api/hazards/{id}/status"),
        Some(&reporter),
        Some(json!({"status": "RESOLVED"})),
    )
    .await;
    expect_error(response, StatusCode::FORBIDDEN, "C014").await;

    let response = request(
        &app,
        "PATCH",
        &format!("/api/hazards/{id}/status"),
        Some(&admin),
        Some(json!({"status": "RESOLVED"})),
    )
    .await;
    let updated = expect_data(response, StatusCode::OK).await;
    assert_eq!(updated["status"], "RESOLVED");

    // A report leaves OPEN exactly once
    let response = request(
        &app,
        "PATCH",
        &format!("/api/hazards/{id}/status"),
        Some(&admin),
        Some(json!({"status": "REJECTED"})),
    )
    .await;
    expect_error(response, StatusCode::CONFLICT, "RP003").await;
}

#[tokio::test]
async fn test_report_deletion_belongs_to_reporter_while_open() {
    let (app, state) = create_test_app();
    let (_, reporter, _) = seed_user(&state, "reporter", Role::User);
    let (_, other, _) = seed_user(&state, "other", Role::User);
    let (_, admin, _) = seed_user(&state, "admin", Role::Admin);

    let response = request(
        &app,
        "POST",
        "/api/hazards",
        Some(&reporter),
        Some(json!({"targetType": "ROUTE", "targetId": 1, "reason": "Flooded path"})),
    )
    .await;
    let report = expect_data(response, StatusCode::CREATED).await;
    let id = report["id"].as_i64().unwrap();

    // Not the reporter
    let response = request(&app, "DELETE", &format!("/api/hazards/{id}"), Some(&other), None).await;
    expect_error(response, StatusCode::FORBIDDEN, "RP002").await;

    // Processed reports cannot be withdrawn
    request(
        &app,
        "PATCH",
        &format!("/api/hazards/{id}/status"),
        Some(&admin),
        Some(json!({"status": "RESOLVED"})),
    )
    .await;
    let response =
        request(&app, "DELETE", &format!("/api/hazards/{id}"), Some(&reporter), None).await;
    expect_error(response, StatusCode::CONFLICT, "RP003").await;
}

#[tokio::test]
async fn test_my_reports_listing() {
    let (app, state) = create_test_app();
    let (_, a, _) = seed_user(&state, "a", Role::User);
    let (_, b, _) = seed_user(&state, "b", Role::User);

    for (token, reason) in [(&a, "Dark alley"), (&b, "Loose dog")] {
        request(
            &app,
            "POST",
            "/api/hazards",
            Some(token),
            Some(json!({"targetType": "LOCATION", "targetId": 3, "reason": reason})),
        )
        .await;
    }

    let response = request(&app, "GET", "/api/hazards/me", Some(&a), None).await;
    let mine = expect_data(response, StatusCode::OK).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["reason"], "Dark alley");

    let response = request(&app, "GET", "/api/hazards/all", Some(&b), None).await;
    let all = expect_data(response, StatusCode::OK).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}
