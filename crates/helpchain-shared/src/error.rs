use thiserror::Error;

use crate::types::{MessageKind, UserId};

/// Caller-supplied input that violates a message invariant.
///
/// These are never retried; the caller has to fix the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message content is empty")]
    EmptyContent,

    #[error("Sender and recipient are the same user: {0}")]
    SelfAddressed(UserId),

    #[error("User id is empty")]
    EmptyUserId,

    #[error("A {0} message requires meeting details")]
    MissingMeetingDetails(MessageKind),

    #[error("Meeting field `{0}` is empty")]
    BlankMeetingField(&'static str),

    #[error("Only a meeting proposal can be confirmed, got a {0}")]
    NotAProposal(MessageKind),

    #[error("The meeting was not proposed to {0}")]
    NotTheInvitee(UserId),
}
