//! Domain model structs persisted in the message store.
//!
//! Field names match the stored document shape, so the serde form of
//! [`Message`] is the on-the-wire record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use helpchain_shared::{MeetingDetails, MessageId, MessageKind, ReadState, UserId};

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A directed, timestamped message between two users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Store-assigned identifier.
    pub id: MessageId,
    pub from_user_id: UserId,
    /// Sender display name captured at send time.
    #[serde(default)]
    pub from_user_name: String,
    pub to_user_id: UserId,
    /// Recipient display name captured at send time.
    #[serde(default)]
    pub to_user_name: String,
    /// Optional subject the message is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_details: Option<MeetingDetails>,
    #[serde(default)]
    pub is_read: bool,
    /// Client-assigned send time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn read_state(&self) -> ReadState {
        ReadState::from(self.is_read)
    }

    /// The other participant relative to `me`, or `None` if `me` is not a
    /// participant.
    pub fn counterparty(&self, me: &UserId) -> Option<&UserId> {
        if &self.from_user_id == me {
            Some(&self.to_user_id)
        } else if &self.to_user_id == me {
            Some(&self.from_user_id)
        } else {
            None
        }
    }

    /// True if the message was exchanged between `a` and `b`, in either direction.
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.from_user_id == a && &self.to_user_id == b)
            || (&self.from_user_id == b && &self.to_user_id == a)
    }
}

/// A message that has not been written yet. The store assigns the id and
/// every new message starts unread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from_user_id: UserId,
    pub from_user_name: String,
    pub to_user_id: UserId,
    pub to_user_name: String,
    pub subject_id: Option<String>,
    pub content: String,
    pub kind: MessageKind,
    pub meeting_details: Option<MeetingDetails>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries and batches
// ---------------------------------------------------------------------------

/// Server-side filter of a message query or live subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageFilter {
    /// Every message addressed to the user (inbound stream).
    To(UserId),
    /// Every message sent by the user (outbound stream).
    From(UserId),
    /// Messages exchanged between two users, both directions.
    Between(UserId, UserId),
    /// Unread messages addressed to the user.
    UnreadTo(UserId),
}

impl MessageFilter {
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Self::To(user) => &message.to_user_id == user,
            Self::From(user) => &message.from_user_id == user,
            Self::Between(a, b) => message.is_between(a, b),
            Self::UnreadTo(user) => &message.to_user_id == user && !message.is_read,
        }
    }
}

/// A transition applied to every message of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchAction {
    MarkRead,
    MarkUnread,
    Delete,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user, as stored in the user collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// `"admin"` or `"student"`.
    #[serde(default)]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message {
            id: MessageId::new(),
            from_user_id: UserId::from("u1"),
            from_user_name: "Alice".into(),
            to_user_id: UserId::from("u2"),
            to_user_name: "Bob".into(),
            subject_id: None,
            content: "hi".into(),
            kind: MessageKind::Plain,
            meeting_details: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["from_user_id", "to_user_id", "content", "type", "is_read", "created_at"] {
            assert!(obj.contains_key(key), "missing field {key}");
        }
        assert_eq!(obj["type"], "הודעה רגילה");
        assert!(!obj.contains_key("meeting_details"));
    }

    #[test]
    fn test_filters() {
        let msg = sample();
        let u1 = UserId::from("u1");
        let u2 = UserId::from("u2");
        let u3 = UserId::from("u3");

        assert!(MessageFilter::To(u2.clone()).matches(&msg));
        assert!(MessageFilter::From(u1.clone()).matches(&msg));
        assert!(MessageFilter::Between(u2.clone(), u1.clone()).matches(&msg));
        assert!(!MessageFilter::Between(u1.clone(), u3.clone()).matches(&msg));
        assert!(MessageFilter::UnreadTo(u2.clone()).matches(&msg));

        assert_eq!(msg.counterparty(&u1), Some(&u2));
        assert_eq!(msg.counterparty(&u3), None);
    }
}
