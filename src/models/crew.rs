// SPDX-License-Identifier: MIT

//! Crew aggregate: the group-running event, its participants, and the
//! authorization predicates evaluated before any mutation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::user::User;

/// Recruitment status of a crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrewStatus {
    Open,
    Closed,
    Cancelled,
}

impl CrewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CrewStatus::Open => "OPEN",
            CrewStatus::Closed => "CLOSED",
            CrewStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "OPEN" => Some(CrewStatus::Open),
            "CLOSED" => Some(CrewStatus::Closed),
            "CANCELLED" => Some(CrewStatus::Cancelled),
            _ => None,
        }
    }
}

/// Lifecycle of a join application. APPLIED may move to APPROVED or
/// REJECTED; neither ever transitions back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Applied,
    Approved,
    Rejected,
}

impl ParticipantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantStatus::Applied => "APPLIED",
            ParticipantStatus::Approved => "APPROVED",
            ParticipantStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "APPLIED" => Some(ParticipantStatus::Applied),
            "APPROVED" => Some(ParticipantStatus::Approved),
            "REJECTED" => Some(ParticipantStatus::Rejected),
            _ => None,
        }
    }
}

/// Three-tier safety classification, always derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyLevel {
    Safe,
    Medium,
    Unsafe,
}

impl SafetyLevel {
    /// SAFE 80-100, MEDIUM 50-79, anything else UNSAFE.
    pub fn from_score(score: i64) -> Self {
        match score {
            80..=100 => SafetyLevel::Safe,
            50..=79 => SafetyLevel::Medium,
            _ => SafetyLevel::Unsafe,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SafetyLevel::Safe => "SAFE",
            SafetyLevel::Medium => "MEDIUM",
            SafetyLevel::Unsafe => "UNSAFE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "SAFE" => Some(SafetyLevel::Safe),
            "MEDIUM" => Some(SafetyLevel::Medium),
            "UNSAFE" => Some(SafetyLevel::Unsafe),
            _ => None,
        }
    }
}

/// A group-running event.
#[derive(Debug, Clone)]
pub struct Crew {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: CrewStatus,
    pub host_id: i64,
    pub max_participants: i64,
    pub route_id: String,
    pub route_type: String,
    pub distance_km: f64,
    pub safety_score: i64,
    pub safety_level: SafetyLevel,
    pub duration_min: i64,
    pub start_location: Option<String>,
    /// Pace encoded as `M'SS"/km`
    pub pace: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    /// Ordered "lat,lng" coordinate pairs
    pub waypoints: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
}

impl Crew {
    pub fn is_host(&self, user: &User) -> bool {
        self.host_id == user.id
    }

    pub fn can_edit(&self, user: &User) -> bool {
        self.is_host(user) || user.role.is_admin()
    }

    pub fn can_delete(&self, user: &User) -> bool {
        self.is_host(user) || user.role.is_admin()
    }

    pub fn update_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn update_description(&mut self, description: String) {
        self.description = Some(description);
    }

    pub fn update_max_participants(&mut self, max_participants: i64) {
        self.max_participants = max_participants;
    }

    pub fn update_waypoints(&mut self, waypoints: Vec<String>) {
        self.waypoints = waypoints;
    }

    pub fn update_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
    }

    pub fn update_start_location(&mut self, start_location: String) {
        self.start_location = Some(start_location);
    }

    pub fn update_pace(&mut self, pace: String) {
        self.pace = Some(pace);
    }

    pub fn update_start_time(&mut self, start_time: NaiveDateTime) {
        self.start_time = Some(start_time);
    }

    pub fn update_status(&mut self, status: CrewStatus) {
        self.status = status;
    }

    /// Replace the route fields as one logical change; the safety level is
    /// re-derived from the new score so the two can never drift apart.
    pub fn update_route_info(
        &mut self,
        route_id: String,
        route_type: String,
        distance_km: f64,
        safety_score: i64,
        duration_min: i64,
        waypoints: Vec<String>,
    ) {
        self.route_id = route_id;
        self.route_type = route_type;
        self.distance_km = distance_km;
        self.safety_score = safety_score;
        self.safety_level = SafetyLevel::from_score(safety_score);
        self.duration_min = duration_min;
        self.waypoints = waypoints;
    }
}

/// A user's application to join a crew.
#[derive(Debug, Clone)]
pub struct CrewParticipant {
    pub id: i64,
    pub crew_id: i64,
    pub user_id: i64,
    pub status: ParticipantStatus,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
}

impl CrewParticipant {
    pub fn is_approved(&self) -> bool {
        self.status == ParticipantStatus::Approved
    }

    pub fn is_applied(&self) -> bool {
        self.status == ParticipantStatus::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn test_user(id: i64, role: Role) -> User {
        User {
            id,
            provider_type: None,
            provider_id: None,
            username: Some(format!("user{}", id)),
            password: None,
            role,
            nickname: None,
            created_at: chrono::Utc::now().naive_utc(),
            modified_at: chrono::Utc::now().naive_utc(),
        }
    }

    fn test_crew(host_id: i64) -> Crew {
        let now = chrono::Utc::now().naive_utc();
        Crew {
            id: 1,
            title: "Morning run".to_string(),
            description: None,
            status: CrewStatus::Open,
            host_id,
            max_participants: 5,
            route_id: "route-1".to_string(),
            route_type: "safe".to_string(),
            distance_km: 5.0,
            safety_score: 85,
            safety_level: SafetyLevel::Safe,
            duration_min: 30,
            start_location: None,
            pace: None,
            start_time: None,
            waypoints: vec![],
            tags: vec![],
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn test_safety_level_from_score() {
        assert_eq!(SafetyLevel::from_score(100), SafetyLevel::Safe);
        assert_eq!(SafetyLevel::from_score(80), SafetyLevel::Safe);
        assert_eq!(SafetyLevel::from_score(79), SafetyLevel::Medium);
        assert_eq!(SafetyLevel::from_score(50), SafetyLevel::Medium);
        assert_eq!(SafetyLevel::from_score(49), SafetyLevel::Unsafe);
        assert_eq!(SafetyLevel::from_score(0), SafetyLevel::Unsafe);
        // Out-of-range scores fall back to UNSAFE
        assert_eq!(SafetyLevel::from_score(101), SafetyLevel::Unsafe);
        assert_eq!(SafetyLevel::from_score(-5), SafetyLevel::Unsafe);
    }

    #[test]
    fn test_update_route_info_rederives_safety_level() {
        let mut crew = test_crew(1);
        assert_eq!(crew.safety_level, SafetyLevel::Safe);

        crew.update_route_info(
            "route-2".to_string(),
            "scenic".to_string(),
            8.0,
            42,
            55,
            vec!["35.86,128.60".to_string()],
        );

        assert_eq!(crew.safety_score, 42);
        assert_eq!(crew.safety_level, SafetyLevel::Unsafe);
        assert_eq!(crew.waypoints.len(), 1);
    }

    #[test]
    fn test_host_and_admin_can_edit() {
        let crew = test_crew(7);

        let host = test_user(7, Role::User);
        let admin = test_user(99, Role::Admin);
        let stranger = test_user(8, Role::User);

        assert!(crew.is_host(&host));
        assert!(crew.can_edit(&host));
        assert!(crew.can_delete(&host));

        assert!(!crew.is_host(&admin));
        assert!(crew.can_edit(&admin));
        assert!(crew.can_delete(&admin));

        assert!(!crew.can_edit(&stranger));
        assert!(!crew.can_delete(&stranger));
    }
}
