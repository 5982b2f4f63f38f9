//! # helpchain-messaging
//!
//! Real-time direct messaging between HelpChain users.
//!
//! - [`ConversationStore`] sends and deletes messages and opens live
//!   subscriptions (inbound, outbound, one conversation) that deliver a full,
//!   filtered and sorted snapshot after every relevant store change.
//! - [`compute_unread_index`] derives per-sender unread counts from an
//!   inbound snapshot.
//! - [`ReadStateManager`] applies read/unread/delete transitions, one at a
//!   time or as an atomic batch.
//! - [`UserDirectory`] labels conversations with display names.
//!
//! Every component works against an injected [`SharedBackend`].

pub mod config;
pub mod conversation;
pub mod directory;
pub mod read_state;
pub mod subscription;
pub mod unread;

mod blocking;
mod error;

use std::sync::Arc;

use helpchain_store::MessageBackend;

pub use config::MessagingConfig;
pub use conversation::{ConversationStore, OutgoingMessage};
pub use directory::UserDirectory;
pub use error::{ErrorKind, MessagingError, Result};
pub use read_state::ReadStateManager;
pub use subscription::{SnapshotOrder, Subscription};
pub use unread::{compute_unread_index, UnreadIndex};

pub use helpchain_shared::{MeetingDetails, MessageId, MessageKind, ReadState, UserId};
pub use helpchain_store::{BatchAction, Message, MessageFilter, UserProfile};

/// Store client shared by every component of a session.
pub type SharedBackend = Arc<dyn MessageBackend>;
