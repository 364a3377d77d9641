// SPDX-License-Identifier: MIT

//! Running record queries and the SQL-side aggregates behind user stats.

use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{dt_from_sql, dt_to_sql, opt_dt_from_sql, Database};
use crate::models::running::{RunningRecord, RunningStats};

const RECORD_COLUMNS: &str = "id, user_id, distance_km, duration_minutes, pace_min_per_km, \
     pace, best_pace, start_time, end_time, route_data, weather, notes, created_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<RunningRecord> {
    let start_time: Option<String> = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;
    let created_at: String = row.get("created_at")?;

    Ok(RunningRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        distance_km: row.get("distance_km")?,
        duration_minutes: row.get("duration_minutes")?,
        pace_min_per_km: row.get("pace_min_per_km")?,
        pace: row.get("pace")?,
        best_pace: row.get("best_pace")?,
        start_time: opt_dt_from_sql(start_time)?,
        end_time: opt_dt_from_sql(end_time)?,
        route_data: row.get("route_data")?,
        weather: row.get("weather")?,
        notes: row.get("notes")?,
        created_at: dt_from_sql(&created_at)?,
    })
}

impl Database {
    pub fn insert_running_record(&self, mut record: RunningRecord) -> Result<RunningRecord> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().naive_utc();
            record.created_at = now;

            conn.execute(
                "INSERT INTO running_records (user_id, distance_km, duration_minutes,
                     pace_min_per_km, pace, best_pace, start_time, end_time, route_data,
                     weather, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.user_id,
                    record.distance_km,
                    record.duration_minutes,
                    record.pace_min_per_km,
                    record.pace,
                    record.best_pace,
                    record.start_time.map(dt_to_sql),
                    record.end_time.map(dt_to_sql),
                    record.route_data,
                    record.weather,
                    record.notes,
                    dt_to_sql(now),
                ],
            )?;
            record.id = conn.last_insert_rowid();
            Ok(record)
        })
    }

    /// Aggregate stats over all of a user's runs. Paces with value 0.0
    /// (degenerate records) are left out of the pace aggregates so they
    /// cannot register as an impossibly fast best pace.
    pub fn running_stats(&self, user_id: i64) -> Result<RunningStats> {
        self.with_conn(|conn| {
            let (total_runs, total_distance_km, total_duration_minutes): (i64, f64, i64) = conn
                .query_row(
                    "SELECT COUNT(*), ifnull(SUM(distance_km), 0.0),
                            ifnull(SUM(duration_minutes), 0)
                     FROM running_records WHERE user_id = ?1",
                    [user_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?;

            let (average_pace, best_pace): (f64, f64) = conn.query_row(
                "SELECT ifnull(AVG(pace_min_per_km), 0.0),
                        ifnull(MIN(pace_min_per_km), 0.0)
                 FROM running_records
                 WHERE user_id = ?1 AND pace_min_per_km > 0.0",
                [user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let last_run: Option<String> = conn.query_row(
                "SELECT MAX(ifnull(start_time, created_at))
                 FROM running_records WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;

            Ok(RunningStats {
                total_runs,
                total_distance_km,
                total_duration_minutes,
                average_pace_min_per_km: average_pace,
                best_pace_min_per_km: best_pace,
                last_run_date: opt_dt_from_sql(last_run)?,
            })
        })
    }

    /// The user's most recent runs, newest first.
    pub fn recent_running_records(&self, user_id: i64, limit: i64) -> Result<Vec<RunningRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM running_records
                 WHERE user_id = ?1
                 ORDER BY ifnull(start_time, created_at) DESC, id DESC
                 LIMIT ?2"
            ))?;
            let records = stmt
                .query_map(params![user_id, limit], record_from_row)?
                .collect::<rusqlite::Result<Vec<RunningRecord>>>()?;
            Ok(records)
        })
    }
}
