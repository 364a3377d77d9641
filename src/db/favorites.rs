// SPDX-License-Identifier: MIT

//! Favorite route queries. All lookups are scoped to the owning user.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{dt_from_sql, dt_to_sql, Database};
use crate::models::crew::SafetyLevel;
use crate::models::favorite::Favorite;

const FAVORITE_COLUMNS: &str = "id, user_id, name, saved_polyline, distance_m, duration_s, \
     safety_score, safety_level, created_at, modified_at";

fn favorite_from_row(row: &Row<'_>) -> rusqlite::Result<Favorite> {
    let safety_level: Option<String> = row.get("safety_level")?;
    let created_at: String = row.get("created_at")?;
    let modified_at: String = row.get("modified_at")?;

    Ok(Favorite {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        waypoints: Vec::new(),
        saved_polyline: row.get("saved_polyline")?,
        distance_m: row.get("distance_m")?,
        duration_s: row.get("duration_s")?,
        safety_score: row.get("safety_score")?,
        safety_level: safety_level.as_deref().and_then(SafetyLevel::parse),
        tags: Vec::new(),
        created_at: dt_from_sql(&created_at)?,
        modified_at: dt_from_sql(&modified_at)?,
    })
}

fn load_collections(conn: &Connection, favorite: &mut Favorite) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT waypoint FROM favorite_waypoints WHERE favorite_id = ?1 ORDER BY seq")?;
    favorite.waypoints = stmt
        .query_map([favorite.id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    let mut stmt =
        conn.prepare("SELECT tag FROM favorite_tags WHERE favorite_id = ?1 ORDER BY tag")?;
    favorite.tags = stmt
        .query_map([favorite.id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    Ok(())
}

fn replace_collections(conn: &Connection, favorite: &Favorite) -> Result<()> {
    conn.execute(
        "DELETE FROM favorite_waypoints WHERE favorite_id = ?1",
        [favorite.id],
    )?;
    conn.execute(
        "DELETE FROM favorite_tags WHERE favorite_id = ?1",
        [favorite.id],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO favorite_waypoints (favorite_id, seq, waypoint) VALUES (?1, ?2, ?3)",
    )?;
    for (seq, waypoint) in favorite.waypoints.iter().enumerate() {
        stmt.execute(params![favorite.id, seq as i64, waypoint])?;
    }

    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO favorite_tags (favorite_id, tag) VALUES (?1, ?2)")?;
    for tag in &favorite.tags {
        stmt.execute(params![favorite.id, tag])?;
    }

    Ok(())
}

impl Database {
    pub fn insert_favorite(&self, mut favorite: Favorite) -> Result<Favorite> {
        self.with_conn(|conn| {
            let now = chrono::Utc::now().naive_utc();
            favorite.created_at = now;
            favorite.modified_at = now;

            conn.execute(
                "INSERT INTO favorites (user_id, name, saved_polyline, distance_m, duration_s,
                     safety_score, safety_level, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    favorite.user_id,
                    favorite.name,
                    favorite.saved_polyline,
                    favorite.distance_m,
                    favorite.duration_s,
                    favorite.safety_score,
                    favorite.safety_level.map(SafetyLevel::as_str),
                    dt_to_sql(now),
                ],
            )?;
            favorite.id = conn.last_insert_rowid();
            replace_collections(conn, &favorite)?;
            Ok(favorite)
        })
    }

    /// Look up a favorite the user owns. Somebody else's favorite behaves
    /// exactly like a missing one.
    pub fn get_favorite(&self, id: i64, user_id: i64) -> Result<Option<Favorite>> {
        self.with_conn(|conn| {
            let favorite = conn
                .query_row(
                    &format!("SELECT {FAVORITE_COLUMNS} FROM favorites WHERE id = ?1 AND user_id = ?2"),
                    params![id, user_id],
                    favorite_from_row,
                )
                .optional()?;

            match favorite {
                None => Ok(None),
                Some(mut favorite) => {
                    load_collections(conn, &mut favorite)?;
                    Ok(Some(favorite))
                }
            }
        })
    }

    /// All favorites of one user, newest first.
    pub fn favorites_for_user(&self, user_id: i64) -> Result<Vec<Favorite>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FAVORITE_COLUMNS} FROM favorites
                 WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
            ))?;
            let mut favorites = stmt
                .query_map([user_id], favorite_from_row)?
                .collect::<rusqlite::Result<Vec<Favorite>>>()?;

            for favorite in &mut favorites {
                load_collections(conn, favorite)?;
            }
            Ok(favorites)
        })
    }

    /// Delete a favorite the user owns. Returns whether a row was removed.
    pub fn delete_favorite(&self, id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM favorites WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(deleted > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn make_favorite(user_id: i64, name: &str) -> Favorite {
        let now = chrono::Utc::now().naive_utc();
        Favorite {
            id: 0,
            user_id,
            name: name.to_string(),
            waypoints: vec!["35.86,128.60".to_string()],
            saved_polyline: Some("abc123".to_string()),
            distance_m: Some(5000),
            duration_s: Some(1800),
            safety_score: Some(90),
            safety_level: Some(SafetyLevel::Safe),
            tags: vec!["park".to_string()],
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn test_favorite_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_local_user("u", "hash", None, Role::User).unwrap();

        let saved = db.insert_favorite(make_favorite(user, "Park loop")).unwrap();
        let loaded = db.get_favorite(saved.id, user).unwrap().unwrap();

        assert_eq!(loaded.name, "Park loop");
        assert_eq!(loaded.waypoints, vec!["35.86,128.60"]);
        assert_eq!(loaded.tags, vec!["park"]);
        assert_eq!(loaded.safety_level, Some(SafetyLevel::Safe));
    }

    #[test]
    fn test_other_users_favorite_is_invisible() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_local_user("owner", "hash", None, Role::User).unwrap();
        let other = db.create_local_user("other", "hash", None, Role::User).unwrap();

        let saved = db.insert_favorite(make_favorite(owner, "Mine")).unwrap();

        assert!(db.get_favorite(saved.id, other).unwrap().is_none());
        assert!(!db.delete_favorite(saved.id, other).unwrap());
        assert!(db.get_favorite(saved.id, owner).unwrap().is_some());
    }

    #[test]
    fn test_list_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_local_user("u", "hash", None, Role::User).unwrap();

        db.insert_favorite(make_favorite(user, "First")).unwrap();
        db.insert_favorite(make_favorite(user, "Second")).unwrap();

        let list = db.favorites_for_user(user).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Second");
    }
}
