//! Read-state transitions: read, unread and delete, singly or in batches.
//!
//! Per message the states are unread, read and deleted. Unread and read can
//! be re-entered freely (setting the current value again succeeds); deleted
//! is terminal and every later transition fails with `NotFound`.

use std::collections::BTreeSet;

use tracing::{debug, info};

use helpchain_shared::{MessageId, ReadState, UserId};
use helpchain_store::{BatchAction, MessageFilter};

use crate::blocking;
use crate::error::Result;
use crate::SharedBackend;

/// Applies read-state transitions against the store.
///
/// No state is cached here; the next subscription snapshot is the
/// authoritative view of any transition.
#[derive(Clone)]
pub struct ReadStateManager {
    backend: SharedBackend,
}

impl ReadStateManager {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub async fn mark_read(&self, id: MessageId) -> Result<()> {
        self.set_read(id, true).await
    }

    pub async fn mark_unread(&self, id: MessageId) -> Result<()> {
        self.set_read(id, false).await
    }

    /// Set the read flag to an explicit value.
    pub async fn set_read(&self, id: MessageId, is_read: bool) -> Result<()> {
        blocking::run(&self.backend, move |store| store.set_read(id, is_read)).await?;
        debug!(msg_id = %id, is_read, "read flag written");
        Ok(())
    }

    /// Flip the read flag based on the last stored value.
    ///
    /// Two toggles issued before either lands can read the same value and
    /// both write the same result.
    #[deprecated(note = "use `set_read` with an explicit value")]
    pub async fn toggle_read(&self, id: MessageId) -> Result<ReadState> {
        let current = blocking::run(&self.backend, move |store| store.get_message(id))
            .await?
            .read_state();
        let target = current.flipped();
        self.set_read(id, target.is_read()).await?;
        Ok(target)
    }

    /// Apply `action` to every id as one atomic unit.
    ///
    /// Duplicate ids are applied once. If any id does not exist the whole
    /// batch fails with `NotFound` listing the missing ids, and nothing is
    /// applied. Returns the number of distinct messages transitioned.
    pub async fn batch_apply(&self, ids: &[MessageId], action: BatchAction) -> Result<usize> {
        let unique: Vec<MessageId> = ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return Ok(0);
        }

        let count = unique.len();
        let touched =
            blocking::run(&self.backend, move |store| store.apply_batch(&unique, action)).await?;

        info!(?action, requested = count, touched, "batch applied");
        Ok(touched)
    }

    /// Mark everything `counterpart` sent to `current` as read in one batch,
    /// as a conversation view does when it is opened. Returns how many
    /// messages changed state.
    pub async fn mark_conversation_read(
        &self,
        current: &UserId,
        counterpart: &UserId,
    ) -> Result<usize> {
        let filter = MessageFilter::UnreadTo(current.clone());
        let counterpart_id = counterpart.clone();
        let unread: Vec<MessageId> = blocking::run(&self.backend, move |store| {
            store.query_messages(&filter)
        })
        .await?
        .into_iter()
        .filter(|m| m.from_user_id == counterpart_id)
        .map(|m| m.id)
        .collect();

        self.batch_apply(&unread, BatchAction::MarkRead).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use helpchain_shared::MessageKind;
    use helpchain_store::{Message, NewMessage, SqliteBackend};

    use super::*;
    use crate::error::MessagingError;
    use crate::unread::compute_unread_index;

    fn setup() -> (SharedBackend, ReadStateManager) {
        let backend: SharedBackend = Arc::new(SqliteBackend::in_memory().unwrap());
        let manager = ReadStateManager::new(backend.clone());
        (backend, manager)
    }

    fn insert(backend: &SharedBackend, from: &str, to: &str) -> Message {
        backend
            .insert_message(&NewMessage {
                from_user_id: UserId::from(from),
                from_user_name: String::new(),
                to_user_id: UserId::from(to),
                to_user_name: String::new(),
                subject_id: None,
                content: "question".into(),
                kind: MessageKind::Plain,
                meeting_details: None,
                created_at: Utc::now(),
            })
            .unwrap()
    }

    fn is_read(backend: &SharedBackend, id: MessageId) -> bool {
        backend.get_message(id).unwrap().is_read
    }

    #[tokio::test]
    async fn test_mark_read_twice_is_ok() {
        let (backend, manager) = setup();
        let msg = insert(&backend, "u1", "u2");

        manager.mark_read(msg.id).await.unwrap();
        manager.mark_read(msg.id).await.unwrap();
        assert!(is_read(&backend, msg.id));

        manager.mark_unread(msg.id).await.unwrap();
        manager.mark_unread(msg.id).await.unwrap();
        assert!(!is_read(&backend, msg.id));
    }

    #[tokio::test]
    async fn test_set_read_explicit() {
        let (backend, manager) = setup();
        let msg = insert(&backend, "u1", "u2");

        manager.set_read(msg.id, true).await.unwrap();
        assert!(is_read(&backend, msg.id));
        manager.set_read(msg.id, false).await.unwrap();
        assert!(!is_read(&backend, msg.id));
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn test_toggle_flips_stored_state() {
        let (backend, manager) = setup();
        let msg = insert(&backend, "u1", "u2");

        assert_eq!(manager.toggle_read(msg.id).await.unwrap(), ReadState::Read);
        assert!(is_read(&backend, msg.id));
        assert_eq!(manager.toggle_read(msg.id).await.unwrap(), ReadState::Unread);
        assert!(!is_read(&backend, msg.id));
    }

    #[tokio::test]
    async fn test_transitions_on_missing_message_fail() {
        let (_backend, manager) = setup();
        let ghost = MessageId::new();

        let err = manager.mark_read(ghost).await.unwrap_err();
        assert_eq!(err, MessagingError::NotFound(vec![ghost]));
        assert!(manager.mark_unread(ghost).await.is_err());
    }

    #[tokio::test]
    async fn test_batch_mark_read() {
        let (backend, manager) = setup();
        let m1 = insert(&backend, "u1", "u2");
        let m2 = insert(&backend, "u3", "u2");

        let touched = manager
            .batch_apply(&[m1.id, m2.id, m1.id], BatchAction::MarkRead)
            .await
            .unwrap();
        assert_eq!(touched, 2);
        assert!(is_read(&backend, m1.id));
        assert!(is_read(&backend, m2.id));

        manager
            .batch_apply(&[m1.id, m2.id], BatchAction::MarkUnread)
            .await
            .unwrap();
        assert!(!is_read(&backend, m1.id));
    }

    #[tokio::test]
    async fn test_batch_delete_with_missing_id_applies_nothing() {
        let (backend, manager) = setup();
        let m1 = insert(&backend, "u1", "u2");
        let m3 = insert(&backend, "u1", "u2");
        let m2 = MessageId::new();

        let err = manager
            .batch_apply(&[m1.id, m2, m3.id], BatchAction::Delete)
            .await
            .unwrap_err();
        assert_eq!(err, MessagingError::NotFound(vec![m2]));

        assert!(backend.get_message(m1.id).is_ok());
        assert!(backend.get_message(m3.id).is_ok());
    }

    #[tokio::test]
    async fn test_batch_delete_then_transition_fails() {
        let (backend, manager) = setup();
        let m1 = insert(&backend, "u1", "u2");

        manager.batch_apply(&[m1.id], BatchAction::Delete).await.unwrap();
        assert!(manager.mark_read(m1.id).await.is_err());
        assert!(manager
            .batch_apply(&[m1.id], BatchAction::MarkRead)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let (_backend, manager) = setup();
        assert_eq!(manager.batch_apply(&[], BatchAction::Delete).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_conversation_read() {
        let (backend, manager) = setup();
        insert(&backend, "u1", "me");
        insert(&backend, "u1", "me");
        insert(&backend, "u3", "me");
        insert(&backend, "me", "u1");

        let changed = manager
            .mark_conversation_read(&UserId::from("me"), &UserId::from("u1"))
            .await
            .unwrap();
        assert_eq!(changed, 2);

        let inbound = backend
            .query_messages(&MessageFilter::To(UserId::from("me")))
            .unwrap();
        let index = compute_unread_index(&inbound);
        assert!(!index.contains(&UserId::from("u1")));
        assert_eq!(index.get(&UserId::from("u3")), 1);

        // Nothing left to mark.
        let changed = manager
            .mark_conversation_read(&UserId::from("me"), &UserId::from("u1"))
            .await
            .unwrap();
        assert_eq!(changed, 0);
    }
}
