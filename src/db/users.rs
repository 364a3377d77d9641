// SPDX-License-Identifier: MIT

//! User account queries.

use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{dt_from_sql, dt_to_sql, Database};
use crate::models::user::{ProviderType, Role, User};

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let provider_type: Option<String> = row.get("provider_type")?;
    let role: String = row.get("role")?;
    let created_at: String = row.get("created_at")?;
    let modified_at: String = row.get("modified_at")?;

    Ok(User {
        id: row.get("id")?,
        provider_type: provider_type.as_deref().and_then(ProviderType::parse),
        provider_id: row.get("provider_id")?,
        username: row.get("username")?,
        password: row.get("password")?,
        role: Role::parse(&role).unwrap_or(Role::NotRegistered),
        nickname: row.get("nickname")?,
        created_at: dt_from_sql(&created_at)?,
        modified_at: dt_from_sql(&modified_at)?,
    })
}

const USER_COLUMNS: &str =
    "id, provider_type, provider_id, username, password, role, nickname, created_at, modified_at";

impl Database {
    /// Insert a local username/password account. Returns the new user id.
    pub fn create_local_user(
        &self,
        username: &str,
        password_hash: &str,
        nickname: Option<&str>,
        role: Role,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            let now = dt_to_sql(chrono::Utc::now().naive_utc());
            conn.execute(
                "INSERT INTO users (username, password, role, nickname, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![username, password_hash, role.as_str(), nickname, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    [id],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                    [username],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }
}
