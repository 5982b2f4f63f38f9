use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_MEETING_DURATION;
use crate::error::ValidationError;

/// Opaque user identifier issued by the authentication provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Store-assigned message identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Category tag of a message.
///
/// The serialized values are the strings already present in stored
/// documents, so they must not change.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageKind {
    #[default]
    #[serde(rename = "הודעה רגילה")]
    Plain,
    #[serde(rename = "הצעת פגישה")]
    MeetingProposal,
    #[serde(rename = "אישור פגישה")]
    MeetingConfirmation,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "הודעה רגילה",
            Self::MeetingProposal => "הצעת פגישה",
            Self::MeetingConfirmation => "אישור פגישה",
        }
    }

    pub fn from_stored(s: &str) -> Option<Self> {
        match s {
            "הודעה רגילה" => Some(Self::Plain),
            "הצעת פגישה" => Some(Self::MeetingProposal),
            "אישור פגישה" => Some(Self::MeetingConfirmation),
            _ => None,
        }
    }

    /// Meeting proposals and confirmations carry a [`MeetingDetails`] record.
    pub fn requires_meeting(&self) -> bool {
        !matches!(self, Self::Plain)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Plain => "plain",
            Self::MeetingProposal => "meeting proposal",
            Self::MeetingConfirmation => "meeting confirmation",
        };
        f.write_str(label)
    }
}

fn default_duration() -> String {
    DEFAULT_MEETING_DURATION.to_string()
}

/// Meeting proposal embedded in a message.
///
/// Date and time are kept as the strings the scheduling form produced
/// (`YYYY-MM-DD` and `HH:MM`); duration is in minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeetingDetails {
    pub date: String,
    pub time: String,
    #[serde(default = "default_duration")]
    pub duration: String,
    pub place: String,
    pub subject_id: String,
}

impl MeetingDetails {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        place: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            duration: default_duration(),
            place: place.into(),
            subject_id: subject_id.into(),
        }
    }

    pub fn with_duration(mut self, minutes: impl Into<String>) -> Self {
        self.duration = minutes.into();
        self
    }

    /// Every field the scheduling form marks as required must be filled.
    /// A blank duration falls back to the default instead of failing.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        let required = [
            ("date", &self.date),
            ("time", &self.time),
            ("place", &self.place),
            ("subject_id", &self.subject_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::BlankMeetingField(name));
            }
        }
        if self.duration.trim().is_empty() {
            self.duration = default_duration();
        }
        Ok(())
    }
}

/// Read flag of a message as a two-state value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReadState {
    Unread,
    Read,
}

impl ReadState {
    pub fn is_read(self) -> bool {
        matches!(self, Self::Read)
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Unread => Self::Read,
            Self::Read => Self::Unread,
        }
    }
}

impl From<bool> for ReadState {
    fn from(is_read: bool) -> Self {
        if is_read {
            Self::Read
        } else {
            Self::Unread
        }
    }
}
