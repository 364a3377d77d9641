// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod crew;
pub mod favorite;
pub mod page;
pub mod report;
pub mod running;
pub mod user;

pub use crew::{Crew, CrewParticipant, CrewStatus, ParticipantStatus, SafetyLevel};
pub use favorite::Favorite;
pub use page::Page;
pub use report::{Report, ReportStatus, TargetType};
pub use running::{RunningRecord, RunningStats};
pub use user::{ProviderType, Role, User};
