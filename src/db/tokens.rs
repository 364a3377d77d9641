// SPDX-License-Identifier: MIT

//! Refresh token slot queries.
//!
//! One row per (user, device) slot; NULL device is the single default slot.
//! Rotation overwrites a row in place, so the table only ever holds the
//! latest token string per slot.

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{dt_from_sql, dt_to_sql, Database};

/// A stored refresh token slot.
#[derive(Debug, Clone)]
pub struct RefreshTokenRow {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub device_id: Option<String>,
    pub expires_at: NaiveDateTime,
}

impl RefreshTokenRow {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at < now
    }
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<RefreshTokenRow> {
    let expires_at: String = row.get("expires_at")?;
    Ok(RefreshTokenRow {
        id: row.get("id")?,
        token: row.get("token")?,
        user_id: row.get("user_id")?,
        device_id: row.get("device_id")?,
        expires_at: dt_from_sql(&expires_at)?,
    })
}

impl Database {
    /// Write a refresh token into the (user, device) slot: overwrite the
    /// existing row in place if one exists, insert otherwise.
    pub fn upsert_refresh_slot(
        &self,
        user_id: i64,
        device_id: Option<&str>,
        token: &str,
        expires_at: NaiveDateTime,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let now = dt_to_sql(chrono::Utc::now().naive_utc());
            let expires = dt_to_sql(expires_at);

            let updated = conn.execute(
                "UPDATE refresh_tokens
                 SET token = ?1, expires_at = ?2, modified_at = ?3
                 WHERE user_id = ?4 AND device_id IS ?5",
                params![token, expires, now, user_id, device_id],
            )?;

            if updated == 0 {
                conn.execute(
                    "INSERT INTO refresh_tokens
                         (token, user_id, device_id, expires_at, created_at, modified_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![token, user_id, device_id, expires, now],
                )?;
            }
            Ok(())
        })
    }

    pub fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, token, user_id, device_id, expires_at
                     FROM refresh_tokens WHERE token = ?1",
                    [token],
                    token_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Rotate a slot in place: same row identity, new token string and expiry.
    pub fn rotate_refresh_token(
        &self,
        slot_id: i64,
        new_token: &str,
        expires_at: NaiveDateTime,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let now = dt_to_sql(chrono::Utc::now().naive_utc());
            conn.execute(
                "UPDATE refresh_tokens
                 SET token = ?1, expires_at = ?2, modified_at = ?3
                 WHERE id = ?4",
                params![new_token, dt_to_sql(expires_at), now, slot_id],
            )?;
            Ok(())
        })
    }

    /// Delete the row holding exactly this token string (single-device
    /// logout). Returns whether a row was deleted.
    pub fn delete_refresh_token(&self, token: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM refresh_tokens WHERE token = ?1", [token])?;
            Ok(deleted > 0)
        })
    }

    /// Delete every refresh token owned by the user (global logout).
    /// Returns the number of revoked slots.
    pub fn delete_all_refresh_tokens(&self, user_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM refresh_tokens WHERE user_id = ?1", [user_id])?;
            Ok(deleted)
        })
    }

    #[cfg(test)]
    pub fn count_refresh_tokens(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn db_with_user() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user_id = db
            .create_local_user("runner", "hash", None, Role::User)
            .unwrap();
        (db, user_id)
    }

    fn future() -> NaiveDateTime {
        chrono::Utc::now().naive_utc() + chrono::Duration::days(14)
    }

    #[test]
    fn test_upsert_overwrites_slot_in_place() {
        let (db, user_id) = db_with_user();

        db.upsert_refresh_slot(user_id, None, "token-a", future())
            .unwrap();
        db.upsert_refresh_slot(user_id, None, "token-b", future())
            .unwrap();

        assert_eq!(db.count_refresh_tokens(user_id).unwrap(), 1);
        assert!(db.find_refresh_token("token-a").unwrap().is_none());
        assert!(db.find_refresh_token("token-b").unwrap().is_some());
    }

    #[test]
    fn test_distinct_devices_get_distinct_slots() {
        let (db, user_id) = db_with_user();

        db.upsert_refresh_slot(user_id, None, "token-default", future())
            .unwrap();
        db.upsert_refresh_slot(user_id, Some("phone"), "token-phone", future())
            .unwrap();
        db.upsert_refresh_slot(user_id, Some("laptop"), "token-laptop", future())
            .unwrap();

        assert_eq!(db.count_refresh_tokens(user_id).unwrap(), 3);
    }

    #[test]
    fn test_rotate_replaces_token_string() {
        let (db, user_id) = db_with_user();

        db.upsert_refresh_slot(user_id, None, "old", future()).unwrap();
        let slot = db.find_refresh_token("old").unwrap().unwrap();

        db.rotate_refresh_token(slot.id, "new", future()).unwrap();

        assert!(db.find_refresh_token("old").unwrap().is_none());
        let rotated = db.find_refresh_token("new").unwrap().unwrap();
        assert_eq!(rotated.id, slot.id);
    }

    #[test]
    fn test_delete_all_for_user() {
        let (db, user_id) = db_with_user();

        db.upsert_refresh_slot(user_id, None, "a", future()).unwrap();
        db.upsert_refresh_slot(user_id, Some("phone"), "b", future())
            .unwrap();

        assert_eq!(db.delete_all_refresh_tokens(user_id).unwrap(), 2);
        assert_eq!(db.count_refresh_tokens(user_id).unwrap(), 0);
    }
}
