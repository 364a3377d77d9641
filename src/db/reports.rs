// SPDX-License-Identifier: MIT

//! Safety report queries.

use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{dt_from_sql, dt_to_sql, Database};
use crate::models::report::{Report, ReportStatus, TargetType};

const REPORT_COLUMNS: &str =
    "id, target_type, target_id, reporter_id, reason, status, created_at, modified_at";

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    let target_type: String = row.get("target_type")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let modified_at: String = row.get("modified_at")?;

    Ok(Report {
        id: row.get("id")?,
        target_type: TargetType::parse(&target_type).unwrap_or(TargetType::Hazard),
        target_id: row.get("target_id")?,
        reporter_id: row.get("reporter_id")?,
        reason: row.get("reason")?,
        status: ReportStatus::parse(&status).unwrap_or(ReportStatus::Open),
        created_at: dt_from_sql(&created_at)?,
        modified_at: dt_from_sql(&modified_at)?,
    })
}

impl Database {
    pub fn insert_report(
        &self,
        target_type: TargetType,
        target_id: i64,
        reporter_id: i64,
        reason: &str,
    ) -> Result<Report> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().naive_utc();
            conn.execute(
                "INSERT INTO reports (target_type, target_id, reporter_id, reason, status,
                     created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, 'OPEN', ?5, ?5)",
                params![target_type.as_str(), target_id, reporter_id, reason, dt_to_sql(now)],
            )?;
            Ok(Report {
                id: conn.last_insert_rowid(),
                target_type,
                target_id,
                reporter_id,
                reason: reason.to_string(),
                status: ReportStatus::Open,
                created_at: now,
                modified_at: now,
            })
        })
    }

    pub fn get_report(&self, id: i64) -> Result<Option<Report>> {
        self.with_conn(|conn| {
            let report = conn
                .query_row(
                    &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
                    [id],
                    report_from_row,
                )
                .optional()?;
            Ok(report)
        })
    }

    /// Every report in the system, newest first. Admin view.
    pub fn all_reports(&self) -> Result<Vec<Report>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC, id DESC"
            ))?;
            let reports = stmt
                .query_map([], report_from_row)?
                .collect::<rusqlite::Result<Vec<Report>>>()?;
            Ok(reports)
        })
    }

    /// Reports filed by one user, newest first.
    pub fn reports_for_user(&self, reporter_id: i64) -> Result<Vec<Report>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REPORT_COLUMNS} FROM reports
                 WHERE reporter_id = ?1 ORDER BY created_at DESC, id DESC"
            ))?;
            let reports = stmt
                .query_map([reporter_id], report_from_row)?
                .collect::<rusqlite::Result<Vec<Report>>>()?;
            Ok(reports)
        })
    }

    pub fn update_report_status(&self, id: i64, status: ReportStatus) -> Result<()> {
        self.with_conn(|conn| {
            let now = dt_to_sql(chrono::Utc::now().naive_utc());
            conn.execute(
                "UPDATE reports SET status = ?1, modified_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_report(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM reports WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    #[test]
    fn test_report_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_local_user("u", "hash", None, Role::User).unwrap();

        let report = db
            .insert_report(TargetType::Hazard, 42, user, "Broken streetlight")
            .unwrap();
        assert_eq!(report.status, ReportStatus::Open);

        db.update_report_status(report.id, ReportStatus::Resolved)
            .unwrap();
        let loaded = db.get_report(report.id).unwrap().unwrap();
        assert_eq!(loaded.status, ReportStatus::Resolved);

        db.delete_report(report.id).unwrap();
        assert!(db.get_report(report.id).unwrap().is_none());
    }

    #[test]
    fn test_reports_for_user_only_own() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_local_user("a", "hash", None, Role::User).unwrap();
        let b = db.create_local_user("b", "hash", None, Role::User).unwrap();

        db.insert_report(TargetType::Route, 1, a, "Flooded path").unwrap();
        db.insert_report(TargetType::Location, 2, b, "Dark alley").unwrap();

        let mine = db.reports_for_user(a).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].reason, "Flooded path");
        assert_eq!(db.all_reports().unwrap().len(), 2);
    }
}
