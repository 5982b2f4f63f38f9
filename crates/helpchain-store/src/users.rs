//! CRUD operations for [`UserProfile`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;

use helpchain_shared::UserId;

use crate::database::Database;
use crate::error::Result;
use crate::messages::encode_timestamp;
use crate::models::UserProfile;

impl Database {
    /// Insert a user, or replace the profile fields of an existing one.
    pub fn upsert_user(&self, user: &UserProfile) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, first_name, last_name, email, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name  = excluded.last_name,
                email      = excluded.email,
                role       = excluded.role",
            params![
                user.id.as_str(),
                user.first_name,
                user.last_name,
                user.email,
                user.role,
                encode_timestamp(&user.created_at),
            ],
        )?;
        Ok(())
    }

    /// Every registered user, ordered by id.
    pub fn list_users(&self) -> Result<Vec<UserProfile>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, first_name, last_name, email, role, created_at
             FROM users ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    let ts_str: String = row.get(5)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(UserProfile {
        id: UserId(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        created_at,
    })
}
