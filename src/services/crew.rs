// SPDX-License-Identifier: MIT

//! Crew lifecycle: creation with a recommended route, partial updates,
//! join applications, host decisions, and the filtered/sorted/paged search.

use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::db::crews::{CrewFilter, ParticipantWithUser};
use crate::db::Database;
use crate::error::{ErrorKind, Result};
use crate::models::crew::{Crew, CrewParticipant, CrewStatus, ParticipantStatus, SafetyLevel};
use crate::models::page::Page;
use crate::models::user::User;
use crate::pace;
use crate::services::route_info::RouteInfoClient;

/// Sort dimension for crew search; one per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortType {
    /// Popularity ranking is not wired to participant counts yet and
    /// currently orders by newest first, same as `Latest`.
    Popular,
    #[default]
    Latest,
    Distance,
    Pace,
    Time,
}

impl SortType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "popular" => Some(SortType::Popular),
            "latest" => Some(SortType::Latest),
            "distance" => Some(SortType::Distance),
            "pace" => Some(SortType::Pace),
            "time" => Some(SortType::Time),
            _ => None,
        }
    }

    /// Every sort reads descending unless the caller asks for ASC.
    fn default_direction(self) -> SortDirection {
        SortDirection::Desc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Everything a crew search request can carry.
#[derive(Debug, Clone, Default)]
pub struct CrewSearch {
    pub filter: CrewFilter,
    /// Crews whose pace is unparseable or absent never match
    pub min_pace: Option<String>,
    pub sort: SortType,
    pub direction: Option<SortDirection>,
    pub page: u32,
    pub size: u32,
}

/// Input for crew creation; the route metadata comes from the
/// recommendation service (or its fallback), except that a caller-supplied
/// route id is kept verbatim.
#[derive(Debug, Clone)]
pub struct CreateCrew {
    pub title: String,
    pub description: Option<String>,
    pub max_participants: i64,
    pub route_id: Option<String>,
    pub start_location: Option<String>,
    pub pace: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub tags: Vec<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateCrew {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<CrewStatus>,
    pub max_participants: Option<i64>,
    pub start_location: Option<String>,
    pub pace: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub waypoints: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Crew detail view: the aggregate, its roster, and the approved head count.
#[derive(Debug, Clone)]
pub struct CrewDetail {
    pub crew: Crew,
    pub participants: Vec<ParticipantWithUser>,
    pub current_participants: i64,
}

#[derive(Clone)]
pub struct CrewService {
    db: Arc<Database>,
    route_client: RouteInfoClient,
}

impl CrewService {
    pub fn new(db: Arc<Database>, route_client: RouteInfoClient) -> Self {
        Self { db, route_client }
    }

    pub async fn create(&self, host: &User, input: CreateCrew) -> Result<Crew> {
        let route = self
            .route_client
            .recommend(input.start_location.as_deref(), input.pace.as_deref())
            .await;

        let now = chrono::Utc::now().naive_utc();
        let crew = Crew {
            id: 0,
            title: input.title,
            description: input.description,
            status: CrewStatus::Open,
            host_id: host.id,
            max_participants: input.max_participants,
            route_id: input.route_id.unwrap_or(route.route_id),
            route_type: route.route_type,
            distance_km: route.distance_km,
            safety_score: route.safety_score,
            safety_level: SafetyLevel::from_score(route.safety_score),
            duration_min: route.duration_min,
            start_location: input.start_location,
            pace: input.pace,
            start_time: input.start_time,
            waypoints: route.waypoints,
            tags: input.tags,
            created_at: now,
            modified_at: now,
        };

        let crew = self.db.insert_crew(crew)?;
        tracing::info!(crew_id = crew.id, host_id = host.id, "Crew created");
        Ok(crew)
    }

    pub fn get(&self, crew_id: i64) -> Result<Crew> {
        self.db
            .get_crew(crew_id)?
            .ok_or_else(|| ErrorKind::CrewNotFound.into())
    }

    pub fn detail(&self, crew_id: i64) -> Result<CrewDetail> {
        let crew = self.get(crew_id)?;
        let participants = self.db.participants_for_crew(crew_id)?;
        let current_participants = self.db.count_approved_participants(crew_id)?;
        Ok(CrewDetail {
            crew,
            participants,
            current_participants,
        })
    }

    pub fn update(&self, actor: &User, crew_id: i64, patch: UpdateCrew) -> Result<Crew> {
        let mut crew = self.get(crew_id)?;
        if !crew.can_edit(actor) {
            return Err(ErrorKind::CrewPermissionDenied.into());
        }

        if let Some(title) = patch.title {
            crew.update_title(title);
        }
        if let Some(description) = patch.description {
            crew.update_description(description);
        }
        if let Some(status) = patch.status {
            crew.update_status(status);
        }
        if let Some(max_participants) = patch.max_participants {
            crew.update_max_participants(max_participants);
        }
        if let Some(start_location) = patch.start_location {
            crew.update_start_location(start_location);
        }
        if let Some(pace) = patch.pace {
            crew.update_pace(pace);
        }
        if let Some(start_time) = patch.start_time {
            crew.update_start_time(start_time);
        }
        if let Some(waypoints) = patch.waypoints {
            crew.update_waypoints(waypoints);
        }
        if let Some(tags) = patch.tags {
            crew.update_tags(tags);
        }

        crew.modified_at = self.db.update_crew(&crew)?;
        Ok(crew)
    }

    pub fn delete(&self, actor: &User, crew_id: i64) -> Result<()> {
        let crew = self.get(crew_id)?;
        if !crew.can_delete(actor) {
            return Err(ErrorKind::CrewPermissionDenied.into());
        }
        self.db.delete_crew(crew_id)?;
        tracing::info!(crew_id, actor_id = actor.id, "Crew deleted");
        Ok(())
    }

    /// Apply to join. Rejected for a closed crew, the host's own crew, or
    /// a user who already has an application row in any state.
    pub fn apply(&self, applicant: &User, crew_id: i64) -> Result<CrewParticipant> {
        let crew = self.get(crew_id)?;

        if crew.status != CrewStatus::Open {
            return Err(ErrorKind::CrewClosed.into());
        }
        if crew.is_host(applicant) {
            return Err(ErrorKind::CrewHostCannotApply.into());
        }
        if self.db.find_participant(crew_id, applicant.id)?.is_some() {
            return Err(ErrorKind::CrewAlreadyJoined.into());
        }

        let participant =
            self.db
                .insert_participant(crew_id, applicant.id, ParticipantStatus::Applied)?;
        Ok(participant)
    }

    /// Host/admin decision on an application. Capacity is intentionally
    /// not checked here; the host decides how many to approve. Re-applying
    /// the same decision is a no-op.
    pub fn decide(
        &self,
        actor: &User,
        crew_id: i64,
        applicant_id: i64,
        approve: bool,
    ) -> Result<CrewParticipant> {
        let crew = self.get(crew_id)?;
        if !crew.can_edit(actor) {
            return Err(ErrorKind::CrewPermissionDenied.into());
        }

        let mut participant = self
            .db
            .find_participant(crew_id, applicant_id)?
            .ok_or(ErrorKind::ParticipantNotFound)?;

        let target = if approve {
            ParticipantStatus::Approved
        } else {
            ParticipantStatus::Rejected
        };

        if participant.status != target {
            self.db.update_participant_status(participant.id, target)?;
            participant.status = target;
        }
        Ok(participant)
    }

    /// Filtered, sorted, paged search. SQL narrows by every predicate it
    /// can express; the pace threshold and all ordering need the decoded
    /// pace values and run here.
    pub fn search(&self, request: &CrewSearch) -> Result<Page<Crew>> {
        let mut crews = self.db.search_crews(&request.filter)?;

        if let Some(min_pace) = &request.min_pace {
            crews.retain(|crew| {
                crew.pace
                    .as_deref()
                    .is_some_and(|p| pace::at_least_as_fast(p, min_pace))
            });
        }

        let direction = request
            .direction
            .unwrap_or_else(|| request.sort.default_direction());
        sort_crews(&mut crews, request.sort, direction);

        Ok(Page::from_full(crews, request.page, request.size))
    }

    /// Every crew, newest first. The unfiltered listing endpoint.
    pub fn all(&self) -> Result<Vec<Crew>> {
        Ok(self.db.search_crews(&CrewFilter::default())?)
    }
}

fn sort_crews(crews: &mut [Crew], sort: SortType, direction: SortDirection) {
    use std::cmp::Ordering;

    // Crews missing the sort key go last regardless of direction
    let key_cmp = |a: &Crew, b: &Crew| -> Ordering {
        let ordering = match sort {
            SortType::Popular | SortType::Latest => a.created_at.cmp(&b.created_at),
            SortType::Distance => a
                .distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal),
            SortType::Pace => {
                let pa = a.pace.as_deref().and_then(pace::parse_min_per_km);
                let pb = b.pace.as_deref().and_then(pace::parse_min_per_km);
                return cmp_optional(pa, pb, direction);
            }
            SortType::Time => return cmp_optional(a.start_time, b.start_time, direction),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    };

    crews.sort_by(|a, b| key_cmp(a, b).then(a.id.cmp(&b.id)));
}

fn cmp_optional<T: PartialOrd>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn service() -> (CrewService, User, User) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let host_id = db.create_local_user("host", "hash", None, Role::User).unwrap();
        let member_id = db
            .create_local_user("member", "hash", None, Role::User)
            .unwrap();
        let host = db.get_user(host_id).unwrap().unwrap();
        let member = db.get_user(member_id).unwrap().unwrap();

        let service = CrewService::new(db, RouteInfoClient::new("http://localhost:5000"));
        (service, host, member)
    }

    fn insert_crew(service: &CrewService, host: &User, title: &str) -> Crew {
        let now = chrono::Utc::now().naive_utc();
        let crew = Crew {
            id: 0,
            title: title.to_string(),
            description: None,
            status: CrewStatus::Open,
            host_id: host.id,
            max_participants: 5,
            route_id: "route-1".to_string(),
            route_type: "safe".to_string(),
            distance_km: 5.0,
            safety_score: 85,
            safety_level: SafetyLevel::Safe,
            duration_min: 30,
            start_location: None,
            pace: Some("6'00\"/km".to_string()),
            start_time: None,
            waypoints: vec![],
            tags: vec![],
            created_at: now,
            modified_at: now,
        };
        service.db.insert_crew(crew).unwrap()
    }

    #[test]
    fn test_apply_guards() {
        let (service, host, member) = service();
        let crew = insert_crew(&service, &host, "Run");

        // Host cannot apply to their own crew
        let err = service.apply(&host, crew.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrewHostCannotApply);

        service.apply(&member, crew.id).unwrap();
        let err = service.apply(&member, crew.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrewAlreadyJoined);

        // Closed crews take no applications
        let patch = UpdateCrew {
            status: Some(CrewStatus::Closed),
            ..Default::default()
        };
        service.update(&host, crew.id, patch).unwrap();
        let other = {
            let id = service
                .db
                .create_local_user("late", "hash", None, Role::User)
                .unwrap();
            service.db.get_user(id).unwrap().unwrap()
        };
        let err = service.apply(&other, crew.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrewClosed);
    }

    #[test]
    fn test_decide_requires_host_or_admin() {
        let (service, host, member) = service();
        let crew = insert_crew(&service, &host, "Run");
        service.apply(&member, crew.id).unwrap();

        let err = service.decide(&member, crew.id, member.id, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrewPermissionDenied);

        let approved = service.decide(&host, crew.id, member.id, true).unwrap();
        assert_eq!(approved.status, ParticipantStatus::Approved);

        // Same decision again is a silent no-op
        let again = service.decide(&host, crew.id, member.id, true).unwrap();
        assert_eq!(again.status, ParticipantStatus::Approved);

        let err = service.decide(&host, crew.id, 9999, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParticipantNotFound);
    }

    #[test]
    fn test_capacity_is_not_enforced_on_decisions() {
        let (service, host, _member) = service();
        let mut crew = insert_crew(&service, &host, "Small");
        crew.update_max_participants(2);
        service.db.update_crew(&crew).unwrap();

        for name in ["a", "b", "c"] {
            let id = service
                .db
                .create_local_user(name, "hash", None, Role::User)
                .unwrap();
            let user = service.db.get_user(id).unwrap().unwrap();
            service.apply(&user, crew.id).unwrap();
            service.decide(&host, crew.id, user.id, true).unwrap();
        }

        // Three approvals against max_participants = 2 all stand
        assert_eq!(service.db.count_approved_participants(crew.id).unwrap(), 3);
    }

    #[test]
    fn test_search_min_pace_is_numeric() {
        let (service, host, _member) = service();

        let mut fast = insert_crew(&service, &host, "Fast");
        fast.update_pace("5'30\"/km".to_string());
        service.db.update_crew(&fast).unwrap();

        let mut slow = insert_crew(&service, &host, "Slow");
        slow.update_pace("7'00\"/km".to_string());
        service.db.update_crew(&slow).unwrap();

        let mut unpaced = insert_crew(&service, &host, "Unpaced");
        unpaced.pace = None;
        service.db.update_crew(&unpaced).unwrap();

        let request = CrewSearch {
            min_pace: Some("6'00\"/km".to_string()),
            size: 20,
            ..Default::default()
        };
        let page = service.search(&request).unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].title, "Fast");
    }

    #[test]
    fn test_search_sort_by_distance() {
        let (service, host, _member) = service();

        let mut long = insert_crew(&service, &host, "Long");
        long.distance_km = 12.0;
        service.db.update_crew(&long).unwrap();
        insert_crew(&service, &host, "Short"); // 5.0

        // Descending is the default for every sort
        let request = CrewSearch {
            sort: SortType::Distance,
            size: 20,
            ..Default::default()
        };
        let page = service.search(&request).unwrap();
        assert_eq!(page.content[0].title, "Long");
        assert_eq!(page.content[1].title, "Short");

        let request = CrewSearch {
            sort: SortType::Distance,
            direction: Some(SortDirection::Asc),
            size: 20,
            ..Default::default()
        };
        let page = service.search(&request).unwrap();
        assert_eq!(page.content[0].title, "Short");
    }

    #[test]
    fn test_search_crews_without_sort_key_go_last() {
        let (service, host, _member) = service();

        let mut unpaced = insert_crew(&service, &host, "Unpaced");
        unpaced.pace = None;
        service.db.update_crew(&unpaced).unwrap();
        insert_crew(&service, &host, "Paced"); // 6'00"/km

        let request = CrewSearch {
            sort: SortType::Pace,
            size: 20,
            ..Default::default()
        };
        let page = service.search(&request).unwrap();
        assert_eq!(page.content[0].title, "Paced");
        assert_eq!(page.content[1].title, "Unpaced");
    }
}
