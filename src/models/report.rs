// SPDX-License-Identifier: MIT

//! Safety (hazard) reports filed by users against a route, location or
//! hazard reference in another subsystem.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// What the report points at. The target id itself is an opaque reference
/// and is not validated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Route,
    Location,
    Hazard,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Route => "ROUTE",
            TargetType::Location => "LOCATION",
            TargetType::Hazard => "HAZARD",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ROUTE" => Some(TargetType::Route),
            "LOCATION" => Some(TargetType::Location),
            "HAZARD" => Some(TargetType::Hazard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Open,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Open => "OPEN",
            ReportStatus::Resolved => "RESOLVED",
            ReportStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "OPEN" => Some(ReportStatus::Open),
            "RESOLVED" => Some(ReportStatus::Resolved),
            "REJECTED" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub id: i64,
    pub target_type: TargetType,
    pub target_id: i64,
    pub reporter_id: i64,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
}

impl Report {
    pub fn is_reporter(&self, user_id: i64) -> bool {
        self.reporter_id == user_id
    }

    pub fn is_open(&self) -> bool {
        self.status == ReportStatus::Open
    }
}
