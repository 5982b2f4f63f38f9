use thiserror::Error;

use helpchain_shared::{MessageId, ValidationError};
use helpchain_store::StoreError;

/// Failures surfaced to callers of the messaging core.
///
/// The three variants map to the three things a user can be told: fix the
/// input, the message no longer exists, or try again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Message not found: {}", join_ids(.0))]
    NotFound(Vec<MessageId>),

    #[error("Store unavailable: {0}")]
    TransientStore(String),
}

/// Coarse classification of a [`MessagingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Transient,
}

impl MessagingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::TransientStore(_) => ErrorKind::Transient,
        }
    }

    /// Only store availability failures are worth retrying. Retrying `send`
    /// still needs caller-side deduplication.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// A missing target means the desired end state (gone) may already hold,
    /// e.g. a second delete of the same message.
    pub fn is_soft(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<StoreError> for MessagingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MessageNotFound(id) => Self::NotFound(vec![MessageId(id)]),
            StoreError::BatchMissing(ids) => {
                Self::NotFound(ids.into_iter().map(MessageId).collect())
            }
            other => Self::TransientStore(other.to_string()),
        }
    }
}

fn join_ids(ids: &[MessageId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MessagingError>;
