//! v003 -- Recipient display name captured at send time.

use rusqlite::Connection;

const UP_SQL: &str = r#"
ALTER TABLE messages ADD COLUMN to_user_name TEXT NOT NULL DEFAULT '';
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
