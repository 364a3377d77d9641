// SPDX-License-Identifier: MIT

//! Saved/bookmarked route, owned exclusively by one user.

use chrono::NaiveDateTime;

use crate::models::crew::SafetyLevel;

#[derive(Debug, Clone)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Ordered "lat,lng" coordinate pairs
    pub waypoints: Vec<String>,
    pub saved_polyline: Option<String>,
    pub distance_m: Option<i64>,
    pub duration_s: Option<i64>,
    pub safety_score: Option<i64>,
    pub safety_level: Option<SafetyLevel>,
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
}
