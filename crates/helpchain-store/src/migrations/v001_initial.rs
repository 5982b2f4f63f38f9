//! v001 -- Initial schema creation.
//!
//! Creates the `users` and `messages` tables. Column names follow the
//! document field names already used by stored data.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY NOT NULL,     -- auth provider uid
    first_name TEXT,
    last_name  TEXT,
    email      TEXT,
    role       TEXT,
    created_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id              TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    from_user_id    TEXT NOT NULL,
    from_user_name  TEXT NOT NULL DEFAULT '',
    to_user_id      TEXT NOT NULL,
    subject_id      TEXT,
    content         TEXT NOT NULL,
    type            TEXT NOT NULL,              -- stored category string
    meeting_details TEXT,                       -- JSON object or NULL
    is_read         INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    created_at      TEXT NOT NULL,              -- RFC-3339, UTC, microseconds

    CHECK (from_user_id <> to_user_id)
);

CREATE INDEX IF NOT EXISTS idx_messages_created_at
    ON messages(created_at);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
