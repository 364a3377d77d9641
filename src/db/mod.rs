// SPDX-License-Identifier: MIT

//! Database layer (embedded SQLite).
//!
//! A single connection behind a mutex; every request-scoped operation is a
//! short blocking call. Query modules hang their functions off [`Database`]
//! in `impl` blocks per aggregate.

pub mod crews;
pub mod favorites;
pub mod reports;
pub mod running;
pub mod tokens;
pub mod users;

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrate(&conn)?;

        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}

/// Datetimes are stored as fixed-width `YYYY-MM-DDTHH:MM:SS` text so that
/// SQL range comparisons stay lexicographic.
const DT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn dt_to_sql(t: NaiveDateTime) -> String {
    t.format(DT_FORMAT).to_string()
}

pub(crate) fn dt_from_sql(raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DT_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

pub(crate) fn opt_dt_from_sql(raw: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    raw.as_deref().map(dt_from_sql).transpose()
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            provider_type   TEXT,
            provider_id     TEXT,
            username        TEXT UNIQUE,
            password        TEXT,
            role            TEXT NOT NULL DEFAULT 'USER',
            nickname        TEXT,
            created_at      TEXT NOT NULL,
            modified_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS crews (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            title             TEXT NOT NULL,
            description       TEXT,
            status            TEXT NOT NULL DEFAULT 'OPEN',
            host_id           INTEGER NOT NULL REFERENCES users(id),
            max_participants  INTEGER NOT NULL,
            route_id          TEXT NOT NULL,
            route_type        TEXT NOT NULL,
            distance_km       REAL NOT NULL,
            safety_score      INTEGER NOT NULL,
            safety_level      TEXT NOT NULL,
            duration_min      INTEGER NOT NULL,
            start_location    TEXT,
            pace              TEXT,
            start_time        TEXT,
            created_at        TEXT NOT NULL,
            modified_at       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS crew_waypoints (
            crew_id     INTEGER NOT NULL REFERENCES crews(id) ON DELETE CASCADE,
            seq         INTEGER NOT NULL,
            waypoint    TEXT NOT NULL,
            PRIMARY KEY (crew_id, seq)
        );

        CREATE TABLE IF NOT EXISTS crew_tags (
            crew_id     INTEGER NOT NULL REFERENCES crews(id) ON DELETE CASCADE,
            tag         TEXT NOT NULL,
            PRIMARY KEY (crew_id, tag)
        );

        CREATE TABLE IF NOT EXISTS crew_participants (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            crew_id     INTEGER NOT NULL REFERENCES crews(id) ON DELETE CASCADE,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            status      TEXT NOT NULL DEFAULT 'APPLIED',
            created_at  TEXT NOT NULL,
            modified_at TEXT NOT NULL,
            UNIQUE (crew_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_crew
            ON crew_participants(crew_id, status);

        CREATE TABLE IF NOT EXISTS favorites (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            name            TEXT NOT NULL,
            saved_polyline  TEXT,
            distance_m      INTEGER,
            duration_s      INTEGER,
            safety_score    INTEGER,
            safety_level    TEXT,
            created_at      TEXT NOT NULL,
            modified_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS favorite_waypoints (
            favorite_id INTEGER NOT NULL REFERENCES favorites(id) ON DELETE CASCADE,
            seq         INTEGER NOT NULL,
            waypoint    TEXT NOT NULL,
            PRIMARY KEY (favorite_id, seq)
        );

        CREATE TABLE IF NOT EXISTS favorite_tags (
            favorite_id INTEGER NOT NULL REFERENCES favorites(id) ON DELETE CASCADE,
            tag         TEXT NOT NULL,
            PRIMARY KEY (favorite_id, tag)
        );

        CREATE TABLE IF NOT EXISTS reports (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            target_type  TEXT NOT NULL,
            target_id    INTEGER NOT NULL,
            reporter_id  INTEGER NOT NULL REFERENCES users(id),
            reason       TEXT NOT NULL,
            status       TEXT NOT NULL DEFAULT 'OPEN',
            created_at   TEXT NOT NULL,
            modified_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS refresh_tokens (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            token       TEXT NOT NULL UNIQUE,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            device_id   TEXT,
            expires_at  TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            modified_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_refresh_user_device
            ON refresh_tokens(user_id, ifnull(device_id, ''));

        CREATE TABLE IF NOT EXISTS running_records (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id           INTEGER NOT NULL REFERENCES users(id),
            distance_km       REAL NOT NULL,
            duration_minutes  INTEGER NOT NULL,
            pace_min_per_km   REAL NOT NULL,
            pace              TEXT NOT NULL,
            best_pace         TEXT,
            start_time        TEXT,
            end_time          TEXT,
            route_data        TEXT,
            weather           TEXT,
            notes             TEXT,
            created_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_running_user
            ON running_records(user_id, start_time);
        ",
    )?;

    tracing::debug!("Database migrations complete");
    Ok(())
}
