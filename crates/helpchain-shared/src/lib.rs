//! Types shared by every HelpChain crate: identifiers, message categories,
//! meeting details and input validation errors.

pub mod constants;
pub mod error;
pub mod types;

pub use error::ValidationError;
pub use types::{MeetingDetails, MessageId, MessageKind, ReadState, UserId};
