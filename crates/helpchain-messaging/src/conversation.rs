//! Conversation store adapter: sending, deleting and live message views.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use helpchain_shared::constants::DEFAULT_USER_NAME;
use helpchain_shared::{MeetingDetails, MessageId, MessageKind, UserId, ValidationError};
use helpchain_store::{Message, MessageFilter, NewMessage};

use crate::blocking;
use crate::config::MessagingConfig;
use crate::error::{MessagingError, Result};
use crate::read_state::ReadStateManager;
use crate::subscription::{SnapshotOrder, Subscription};
use crate::SharedBackend;

/// A message about to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: UserId,
    /// Sender display name stored with the message.
    pub from_name: String,
    pub to: UserId,
    /// Recipient display name stored with the message.
    pub to_name: String,
    pub content: String,
    pub kind: MessageKind,
    pub meeting_details: Option<MeetingDetails>,
    pub subject_id: Option<String>,
}

impl OutgoingMessage {
    pub fn plain(
        from: UserId,
        from_name: impl Into<String>,
        to: UserId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            from,
            from_name: from_name.into(),
            to,
            to_name: String::new(),
            content: content.into(),
            kind: MessageKind::Plain,
            meeting_details: None,
            subject_id: None,
        }
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_recipient_name(mut self, to_name: impl Into<String>) -> Self {
        self.to_name = to_name.into();
        self
    }

    pub fn with_meeting(mut self, details: MeetingDetails) -> Self {
        self.meeting_details = Some(details);
        self
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Check every invariant a new message must satisfy.
    fn validate(&mut self) -> std::result::Result<(), ValidationError> {
        if self.from.is_empty() || self.to.is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        if self.from == self.to {
            return Err(ValidationError::SelfAddressed(self.from.clone()));
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        match self.meeting_details.as_mut() {
            Some(details) => details.validate()?,
            None if self.kind.requires_meeting() => {
                return Err(ValidationError::MissingMeetingDetails(self.kind));
            }
            None => {}
        }
        if self.from_name.trim().is_empty() {
            self.from_name = DEFAULT_USER_NAME.to_string();
        }
        if self.to_name.trim().is_empty() {
            self.to_name = DEFAULT_USER_NAME.to_string();
        }
        Ok(())
    }
}

/// Bridge between callers and the store for message data.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct ConversationStore {
    backend: SharedBackend,
    buffer: usize,
    /// Last `created_at` issued per sender, so one sender's sequence never
    /// goes backwards when the wall clock does.
    last_sent: Mutex<HashMap<UserId, DateTime<Utc>>>,
}

impl ConversationStore {
    pub fn new(backend: SharedBackend, config: &MessagingConfig) -> Self {
        Self {
            backend,
            buffer: config.subscription_buffer,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Read-state manager over the same store.
    pub fn read_states(&self) -> ReadStateManager {
        ReadStateManager::new(self.backend.clone())
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Every message addressed to `user`, newest first.
    pub fn subscribe_inbound(&self, user: &UserId) -> Subscription {
        self.subscribe(MessageFilter::To(user.clone()), SnapshotOrder::NewestFirst)
    }

    /// Every message sent by `user`, newest first.
    pub fn subscribe_outbound(&self, user: &UserId) -> Subscription {
        self.subscribe(MessageFilter::From(user.clone()), SnapshotOrder::NewestFirst)
    }

    /// Unread messages addressed to `user`; feeds an unread badge.
    pub fn subscribe_unread(&self, user: &UserId) -> Subscription {
        self.subscribe(MessageFilter::UnreadTo(user.clone()), SnapshotOrder::NewestFirst)
    }

    /// The full thread between `a` and `b`, oldest first.
    ///
    /// There is no pagination: every snapshot carries the whole history.
    pub fn subscribe_conversation(&self, a: &UserId, b: &UserId) -> Subscription {
        self.subscribe(
            MessageFilter::Between(a.clone(), b.clone()),
            SnapshotOrder::OldestFirst,
        )
    }

    /// Open a subscription with an arbitrary filter and order.
    pub fn subscribe(&self, filter: MessageFilter, order: SnapshotOrder) -> Subscription {
        Subscription::spawn(self.backend.clone(), filter, order, self.buffer)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Validate and write a new unread message, returning the stored record.
    ///
    /// Not retried on failure. Retrying blindly can create a duplicate.
    pub async fn send(&self, mut outgoing: OutgoingMessage) -> Result<Message> {
        outgoing.validate()?;

        let draft = NewMessage {
            created_at: self.next_timestamp(&outgoing.from, Utc::now()),
            from_user_id: outgoing.from,
            from_user_name: outgoing.from_name,
            to_user_id: outgoing.to,
            to_user_name: outgoing.to_name,
            subject_id: outgoing.subject_id,
            content: outgoing.content,
            kind: outgoing.kind,
            meeting_details: outgoing.meeting_details,
        };

        let stored = blocking::run(&self.backend, move |store| store.insert_message(&draft)).await?;

        info!(
            msg_id = %stored.id,
            from = %stored.from_user_id,
            to = %stored.to_user_id,
            kind = %stored.kind,
            "Message sent"
        );
        Ok(stored)
    }

    /// Send a meeting proposal carrying `details`.
    pub async fn propose_meeting(
        &self,
        from: UserId,
        from_name: impl Into<String>,
        to: UserId,
        content: impl Into<String>,
        details: MeetingDetails,
    ) -> Result<Message> {
        let subject = details.subject_id.clone();
        self.send(
            OutgoingMessage::plain(from, from_name, to, content)
                .with_kind(MessageKind::MeetingProposal)
                .with_meeting(details)
                .with_subject(subject),
        )
        .await
    }

    /// Confirm a proposed meeting, echoing its details back to the proposer.
    ///
    /// Only the user the proposal was sent to may confirm it.
    pub async fn confirm_meeting(
        &self,
        from: UserId,
        from_name: impl Into<String>,
        proposal: &Message,
        content: impl Into<String>,
    ) -> Result<Message> {
        if proposal.kind != MessageKind::MeetingProposal {
            return Err(ValidationError::NotAProposal(proposal.kind).into());
        }
        if proposal.to_user_id != from {
            return Err(ValidationError::NotTheInvitee(from).into());
        }
        let details = proposal
            .meeting_details
            .clone()
            .ok_or(ValidationError::MissingMeetingDetails(MessageKind::MeetingConfirmation))?;
        let subject = details.subject_id.clone();
        self.send(
            OutgoingMessage::plain(from, from_name, proposal.from_user_id.clone(), content)
                .with_recipient_name(proposal.from_user_name.clone())
                .with_kind(MessageKind::MeetingConfirmation)
                .with_meeting(details)
                .with_subject(subject),
        )
        .await
    }

    /// Permanently delete a message.
    ///
    /// A missing id fails with [`MessagingError::NotFound`], which callers
    /// may treat as already done ([`MessagingError::is_soft`]).
    pub async fn delete(&self, id: MessageId) -> Result<()> {
        match blocking::run(&self.backend, move |store| store.delete_message(id)).await {
            Ok(()) => {
                info!(msg_id = %id, "Message deleted");
                Ok(())
            }
            Err(e @ MessagingError::NotFound(_)) => {
                warn!(msg_id = %id, "delete of a message that no longer exists");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Clamp `now` so it is not earlier than the sender's previous message.
    fn next_timestamp(&self, sender: &UserId, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut last_sent = match self.last_sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let ts = match last_sent.get(sender) {
            Some(prev) if *prev > now => *prev,
            _ => now,
        };
        last_sent.insert(sender.clone(), ts);
        ts
    }
}
