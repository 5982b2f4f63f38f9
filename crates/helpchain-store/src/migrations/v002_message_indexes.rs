//! v002 -- Indexes for the inbound (unread) and outbound queries.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_messages_to_read
    ON messages(to_user_id, is_read);

CREATE INDEX IF NOT EXISTS idx_messages_from_ts
    ON messages(from_user_id, created_at);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
