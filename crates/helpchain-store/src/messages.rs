//! CRUD and batch operations for [`Message`] records.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use helpchain_shared::{MeetingDetails, MessageId, MessageKind, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{BatchAction, Message, MessageFilter, NewMessage};

const MESSAGE_COLUMNS: &str = "id, from_user_id, from_user_name, to_user_id, subject_id, \
     content, type, meeting_details, is_read, created_at, to_user_name";

/// Fixed-width UTC form so that text ordering in SQL equals time ordering.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Write a new message and return the stored record.
    pub fn insert_message(&self, message: &NewMessage) -> Result<Message> {
        let id = MessageId::new();
        // Stored precision is microseconds; return what a later read sees.
        let created_at = message.created_at.trunc_subsecs(6);
        let meeting_json = message
            .meeting_details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn().execute(
            "INSERT INTO messages (id, from_user_id, from_user_name, to_user_id, subject_id,
                                   content, type, meeting_details, is_read, created_at,
                                   to_user_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10)",
            params![
                id.0.to_string(),
                message.from_user_id.as_str(),
                message.from_user_name,
                message.to_user_id.as_str(),
                message.subject_id,
                message.content,
                message.kind.as_str(),
                meeting_json,
                encode_timestamp(&created_at),
                message.to_user_name,
            ],
        )?;

        Ok(Message {
            id,
            from_user_id: message.from_user_id.clone(),
            from_user_name: message.from_user_name.clone(),
            to_user_id: message.to_user_id.clone(),
            to_user_name: message.to_user_name.clone(),
            subject_id: message.subject_id.clone(),
            content: message.content.clone(),
            kind: message.kind,
            meeting_details: message.meeting_details.clone(),
            is_read: false,
            created_at,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_message(&self, id: MessageId) -> Result<Message> {
        let raw = self
            .conn()
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id.0.to_string()],
                RawMessage::from_row,
            )
            .optional()?;

        match raw {
            Some(raw) => raw.into_message(),
            None => Err(StoreError::MessageNotFound(id.0)),
        }
    }

    /// All messages matching `filter`, oldest first (id breaks ties).
    pub fn query_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>> {
        let (clause, args): (&str, Vec<&str>) = match filter {
            MessageFilter::To(user) => ("to_user_id = ?1", vec![user.as_str()]),
            MessageFilter::From(user) => ("from_user_id = ?1", vec![user.as_str()]),
            MessageFilter::Between(a, b) => (
                "(from_user_id = ?1 AND to_user_id = ?2) OR (from_user_id = ?2 AND to_user_id = ?1)",
                vec![a.as_str(), b.as_str()],
            ),
            MessageFilter::UnreadTo(user) => ("to_user_id = ?1 AND is_read = 0", vec![user.as_str()]),
        };

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE {clause} ORDER BY created_at ASC, id ASC"
        ))?;

        let rows = stmt.query_map(rusqlite::params_from_iter(args), RawMessage::from_row)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?.into_message()?);
        }
        Ok(messages)
    }

    // ------------------------------------------------------------------
    // Update / delete
    // ------------------------------------------------------------------

    /// Set the read flag. Writing the value a message already has succeeds.
    pub fn set_message_read(&self, id: MessageId, is_read: bool) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE messages SET is_read = ?1 WHERE id = ?2",
            params![is_read, id.0.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::MessageNotFound(id.0));
        }
        Ok(())
    }

    /// Permanently remove a message. There is no tombstone.
    pub fn delete_message(&self, id: MessageId) -> Result<()> {
        let affected = self
            .conn()
            .execute("DELETE FROM messages WHERE id = ?1", params![id.0.to_string()])?;
        if affected == 0 {
            return Err(StoreError::MessageNotFound(id.0));
        }
        Ok(())
    }

    /// Apply `action` to every listed message inside one transaction.
    ///
    /// If any id does not exist the transaction is rolled back and
    /// [`StoreError::BatchMissing`] lists the missing ids. Duplicate ids are
    /// applied once. Returns the number of distinct messages touched.
    pub fn apply_batch(&mut self, ids: &[MessageId], action: BatchAction) -> Result<usize> {
        let unique: BTreeSet<Uuid> = ids.iter().map(|id| id.0).collect();

        let tx = self.conn_mut().transaction()?;

        let mut missing = Vec::new();
        for id in &unique {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1)",
                params![id.to_string()],
                |row| row.get(0),
            )?;
            if !exists {
                missing.push(*id);
            }
        }
        if !missing.is_empty() {
            // Dropping `tx` rolls back.
            return Err(StoreError::BatchMissing(missing));
        }

        let sql = match action {
            BatchAction::MarkRead => "UPDATE messages SET is_read = 1 WHERE id = ?1",
            BatchAction::MarkUnread => "UPDATE messages SET is_read = 0 WHERE id = ?1",
            BatchAction::Delete => "DELETE FROM messages WHERE id = ?1",
        };
        {
            let mut stmt = tx.prepare(sql)?;
            for id in &unique {
                stmt.execute(params![id.to_string()])?;
            }
        }

        tx.commit()?;
        Ok(unique.len())
    }
}

/// Column values of one row, before parsing.
struct RawMessage {
    id: String,
    from_user_id: String,
    from_user_name: String,
    to_user_id: String,
    to_user_name: String,
    subject_id: Option<String>,
    content: String,
    kind: String,
    meeting_details: Option<String>,
    is_read: bool,
    created_at: String,
}

impl RawMessage {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            from_user_id: row.get(1)?,
            from_user_name: row.get(2)?,
            to_user_id: row.get(3)?,
            subject_id: row.get(4)?,
            content: row.get(5)?,
            kind: row.get(6)?,
            meeting_details: row.get(7)?,
            is_read: row.get(8)?,
            created_at: row.get(9)?,
            to_user_name: row.get(10)?,
        })
    }

    fn into_message(self) -> Result<Message> {
        let kind =
            MessageKind::from_stored(&self.kind).ok_or(StoreError::UnknownKind(self.kind))?;
        let meeting_details: Option<MeetingDetails> = self
            .meeting_details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)?.with_timezone(&Utc);

        Ok(Message {
            id: MessageId(Uuid::parse_str(&self.id)?),
            from_user_id: UserId(self.from_user_id),
            from_user_name: self.from_user_name,
            to_user_id: UserId(self.to_user_id),
            to_user_name: self.to_user_name,
            subject_id: self.subject_id,
            content: self.content,
            kind,
            meeting_details,
            is_read: self.is_read,
            created_at,
        })
    }
}
