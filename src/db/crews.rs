// SPDX-License-Identifier: MIT

//! Crew and participant queries, including the conditional search filter.
//!
//! The search translates an optional-filter request into a dynamic WHERE
//! clause; every present filter narrows the result set, absent ones add no
//! constraint. Ordering and pagination happen above this layer because the
//! pace predicate and pace ordering need the decoded `M'SS"/km` values.

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::{dt_from_sql, dt_to_sql, opt_dt_from_sql, Database};
use crate::models::crew::{Crew, CrewParticipant, CrewStatus, ParticipantStatus, SafetyLevel};

/// Optional search predicates; every `Some` narrows the result set.
#[derive(Debug, Clone, Default)]
pub struct CrewFilter {
    /// Substring match against title OR description
    pub keyword: Option<String>,
    /// Substring match against start location
    pub start_location: Option<String>,
    pub status: Option<CrewStatus>,
    pub safety_level: Option<SafetyLevel>,
    /// Crew matches if its tag set intersects this set (OR across tags)
    pub tags: Vec<String>,
    /// distance_km <= max_distance
    pub max_distance: Option<f64>,
    /// start_time >= start_time_from
    pub start_time_from: Option<NaiveDateTime>,
}

const CREW_COLUMNS: &str = "id, title, description, status, host_id, max_participants, \
     route_id, route_type, distance_km, safety_score, safety_level, duration_min, \
     start_location, pace, start_time, created_at, modified_at";

fn crew_from_row(row: &Row<'_>) -> rusqlite::Result<Crew> {
    let status: String = row.get("status")?;
    let safety_level: String = row.get("safety_level")?;
    let start_time: Option<String> = row.get("start_time")?;
    let created_at: String = row.get("created_at")?;
    let modified_at: String = row.get("modified_at")?;

    Ok(Crew {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: CrewStatus::parse(&status).unwrap_or(CrewStatus::Open),
        host_id: row.get("host_id")?,
        max_participants: row.get("max_participants")?,
        route_id: row.get("route_id")?,
        route_type: row.get("route_type")?,
        distance_km: row.get("distance_km")?,
        safety_score: row.get("safety_score")?,
        safety_level: SafetyLevel::parse(&safety_level).unwrap_or(SafetyLevel::Unsafe),
        duration_min: row.get("duration_min")?,
        start_location: row.get("start_location")?,
        pace: row.get("pace")?,
        start_time: opt_dt_from_sql(start_time)?,
        waypoints: Vec::new(),
        tags: Vec::new(),
        created_at: dt_from_sql(&created_at)?,
        modified_at: dt_from_sql(&modified_at)?,
    })
}

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<CrewParticipant> {
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let modified_at: String = row.get("modified_at")?;

    Ok(CrewParticipant {
        id: row.get("id")?,
        crew_id: row.get("crew_id")?,
        user_id: row.get("user_id")?,
        status: ParticipantStatus::parse(&status).unwrap_or(ParticipantStatus::Applied),
        created_at: dt_from_sql(&created_at)?,
        modified_at: dt_from_sql(&modified_at)?,
    })
}

/// A participant row joined with the applicant's display fields.
#[derive(Debug, Clone)]
pub struct ParticipantWithUser {
    pub participant: CrewParticipant,
    pub username: Option<String>,
    pub nickname: Option<String>,
}

fn load_collections(conn: &Connection, crew: &mut Crew) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT waypoint FROM crew_waypoints WHERE crew_id = ?1 ORDER BY seq")?;
    crew.waypoints = stmt
        .query_map([crew.id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    let mut stmt = conn.prepare("SELECT tag FROM crew_tags WHERE crew_id = ?1 ORDER BY tag")?;
    crew.tags = stmt
        .query_map([crew.id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    Ok(())
}

fn replace_collections(conn: &Connection, crew: &Crew) -> Result<()> {
    conn.execute("DELETE FROM crew_waypoints WHERE crew_id = ?1", [crew.id])?;
    conn.execute("DELETE FROM crew_tags WHERE crew_id = ?1", [crew.id])?;

    let mut stmt = conn
        .prepare("INSERT INTO crew_waypoints (crew_id, seq, waypoint) VALUES (?1, ?2, ?3)")?;
    for (seq, waypoint) in crew.waypoints.iter().enumerate() {
        stmt.execute(params![crew.id, seq as i64, waypoint])?;
    }

    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO crew_tags (crew_id, tag) VALUES (?1, ?2)")?;
    for tag in &crew.tags {
        stmt.execute(params![crew.id, tag])?;
    }

    Ok(())
}

impl Database {
    /// Insert a crew with its waypoint and tag collections. Returns the
    /// stored crew with its assigned id and timestamps.
    pub fn insert_crew(&self, mut crew: Crew) -> Result<Crew> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().naive_utc();
            crew.created_at = now;
            crew.modified_at = now;

            conn.execute(
                "INSERT INTO crews (title, description, status, host_id, max_participants,
                     route_id, route_type, distance_km, safety_score, safety_level,
                     duration_min, start_location, pace, start_time, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
                params![
                    crew.title,
                    crew.description,
                    crew.status.as_str(),
                    crew.host_id,
                    crew.max_participants,
                    crew.route_id,
                    crew.route_type,
                    crew.distance_km,
                    crew.safety_score,
                    crew.safety_level.as_str(),
                    crew.duration_min,
                    crew.start_location,
                    crew.pace,
                    crew.start_time.map(dt_to_sql),
                    dt_to_sql(now),
                ],
            )?;
            crew.id = conn.last_insert_rowid();
            replace_collections(conn, &crew)?;
            Ok(crew)
        })
    }

    pub fn get_crew(&self, id: i64) -> Result<Option<Crew>> {
        self.with_conn(|conn| {
            let crew = conn
                .query_row(
                    &format!("SELECT {CREW_COLUMNS} FROM crews WHERE id = ?1"),
                    [id],
                    crew_from_row,
                )
                .optional()?;

            match crew {
                None => Ok(None),
                Some(mut crew) => {
                    load_collections(conn, &mut crew)?;
                    Ok(Some(crew))
                }
            }
        })
    }

    /// Persist a mutated crew aggregate: scalar columns plus a full replace
    /// of the waypoint and tag collections.
    pub fn update_crew(&self, crew: &Crew) -> Result<NaiveDateTime> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().naive_utc();
            conn.execute(
                "UPDATE crews SET title = ?1, description = ?2, status = ?3,
                     max_participants = ?4, route_id = ?5, route_type = ?6,
                     distance_km = ?7, safety_score = ?8, safety_level = ?9,
                     duration_min = ?10, start_location = ?11, pace = ?12,
                     start_time = ?13, modified_at = ?14
                 WHERE id = ?15",
                params![
                    crew.title,
                    crew.description,
                    crew.status.as_str(),
                    crew.max_participants,
                    crew.route_id,
                    crew.route_type,
                    crew.distance_km,
                    crew.safety_score,
                    crew.safety_level.as_str(),
                    crew.duration_min,
                    crew.start_location,
                    crew.pace,
                    crew.start_time.map(dt_to_sql),
                    dt_to_sql(now),
                    crew.id,
                ],
            )?;
            replace_collections(conn, crew)?;
            Ok(now)
        })
    }

    pub fn delete_crew(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM crews WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// All crews matching the filter, newest first, with collections
    /// hydrated. The caller applies pace filtering, ordering and paging.
    pub fn search_crews(&self, filter: &CrewFilter) -> Result<Vec<Crew>> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {CREW_COLUMNS} FROM crews c WHERE 1=1");
            let mut values: Vec<Value> = Vec::new();

            if let Some(keyword) = &filter.keyword {
                sql.push_str(
                    " AND (instr(lower(c.title), lower(?)) > 0
                       OR instr(lower(ifnull(c.description, '')), lower(?)) > 0)",
                );
                values.push(Value::Text(keyword.clone()));
                values.push(Value::Text(keyword.clone()));
            }
            if let Some(location) = &filter.start_location {
                sql.push_str(" AND instr(lower(ifnull(c.start_location, '')), lower(?)) > 0");
                values.push(Value::Text(location.clone()));
            }
            if let Some(status) = filter.status {
                sql.push_str(" AND c.status = ?");
                values.push(Value::Text(status.as_str().to_string()));
            }
            if let Some(level) = filter.safety_level {
                sql.push_str(" AND c.safety_level = ?");
                values.push(Value::Text(level.as_str().to_string()));
            }
            if let Some(max_distance) = filter.max_distance {
                sql.push_str(" AND c.distance_km <= ?");
                values.push(Value::Real(max_distance));
            }
            if let Some(from) = filter.start_time_from {
                sql.push_str(" AND c.start_time >= ?");
                values.push(Value::Text(dt_to_sql(from)));
            }
            if !filter.tags.is_empty() {
                let placeholders = vec!["?"; filter.tags.len()].join(", ");
                sql.push_str(&format!(
                    " AND EXISTS (SELECT 1 FROM crew_tags t
                          WHERE t.crew_id = c.id AND t.tag IN ({placeholders}))"
                ));
                for tag in &filter.tags {
                    values.push(Value::Text(tag.clone()));
                }
            }

            sql.push_str(" ORDER BY c.created_at DESC, c.id DESC");

            let mut stmt = conn.prepare(&sql)?;
            let mut crews = stmt
                .query_map(params_from_iter(values), crew_from_row)?
                .collect::<rusqlite::Result<Vec<Crew>>>()?;

            for crew in &mut crews {
                load_collections(conn, crew)?;
            }
            Ok(crews)
        })
    }

    // ─── Participants ────────────────────────────────────────────

    pub fn count_approved_participants(&self, crew_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM crew_participants
                 WHERE crew_id = ?1 AND status = 'APPROVED'",
                [crew_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn find_participant(&self, crew_id: i64, user_id: i64) -> Result<Option<CrewParticipant>> {
        self.with_conn(|conn| {
            let participant = conn
                .query_row(
                    "SELECT id, crew_id, user_id, status, created_at, modified_at
                     FROM crew_participants WHERE crew_id = ?1 AND user_id = ?2",
                    params![crew_id, user_id],
                    participant_from_row,
                )
                .optional()?;
            Ok(participant)
        })
    }

    pub fn insert_participant(
        &self,
        crew_id: i64,
        user_id: i64,
        status: ParticipantStatus,
    ) -> Result<CrewParticipant> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().naive_utc();
            conn.execute(
                "INSERT INTO crew_participants (crew_id, user_id, status, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![crew_id, user_id, status.as_str(), dt_to_sql(now)],
            )?;
            Ok(CrewParticipant {
                id: conn.last_insert_rowid(),
                crew_id,
                user_id,
                status,
                created_at: now,
                modified_at: now,
            })
        })
    }

    pub fn update_participant_status(
        &self,
        participant_id: i64,
        status: ParticipantStatus,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let now = dt_to_sql(chrono::Utc::now().naive_utc());
            conn.execute(
                "UPDATE crew_participants SET status = ?1, modified_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, participant_id],
            )?;
            Ok(())
        })
    }

    /// Participant roster for a crew detail view, oldest application first.
    pub fn participants_for_crew(&self, crew_id: i64) -> Result<Vec<ParticipantWithUser>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.crew_id, p.user_id, p.status, p.created_at, p.modified_at,
                        u.username, u.nickname
                 FROM crew_participants p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.crew_id = ?1
                 ORDER BY p.created_at, p.id",
            )?;

            let rows = stmt
                .query_map([crew_id], |row| {
                    Ok(ParticipantWithUser {
                        participant: participant_from_row(row)?,
                        username: row.get("username")?,
                        nickname: row.get("nickname")?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}
