//! Live snapshot subscriptions.
//!
//! Each subscription owns one task that re-runs its filter every time the
//! store revision advances and forwards the sorted result, skipping results
//! identical to the previous one. Every item is a complete view; consumers
//! never merge diffs.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use helpchain_store::{Message, MessageFilter};

use crate::blocking;
use crate::error::Result;
use crate::SharedBackend;

/// Sort order applied to every snapshot of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrder {
    /// Oldest first; conversation threads.
    OldestFirst,
    /// Newest first; inbox and sent lists.
    NewestFirst,
}

impl SnapshotOrder {
    /// Sort by `created_at`, breaking ties by id so equal timestamps keep a
    /// stable order across snapshots.
    pub fn sort(self, messages: &mut [Message]) {
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if self == Self::NewestFirst {
            messages.reverse();
        }
    }
}

/// Handle to a live subscription.
///
/// Yields `Ok(snapshot)` for the initial state and every change after it.
/// A store failure is yielded once as `Err` and ends the stream; recover by
/// subscribing again. Dropping the handle cancels it.
pub struct Subscription {
    rx: Option<mpsc::Receiver<Result<Vec<Message>>>>,
    task: JoinHandle<()>,
    filter: MessageFilter,
}

impl Subscription {
    pub(crate) fn spawn(
        backend: SharedBackend,
        filter: MessageFilter,
        order: SnapshotOrder,
        buffer: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let task_filter = filter.clone();

        info!(filter = ?filter, "opening subscription");

        let task = tokio::spawn(async move {
            let mut revision = backend.watch_revision();
            let mut last: Option<Vec<Message>> = None;

            loop {
                revision.borrow_and_update();

                let query_filter = task_filter.clone();
                let result =
                    blocking::run(&backend, move |store| store.query_messages(&query_filter)).await;

                match result {
                    Ok(mut snapshot) => {
                        order.sort(&mut snapshot);
                        if last.as_ref() != Some(&snapshot) {
                            debug!(filter = ?task_filter, len = snapshot.len(), "delivering snapshot");
                            if tx.send(Ok(snapshot.clone())).await.is_err() {
                                break;
                            }
                            last = Some(snapshot);
                        }
                    }
                    Err(e) => {
                        warn!(filter = ?task_filter, error = %e, "subscription terminated");
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }

                if revision.changed().await.is_err() {
                    debug!(filter = ?task_filter, "store closed, ending subscription");
                    break;
                }
            }
        });

        Self {
            rx: Some(rx),
            task,
            filter,
        }
    }

    /// Wait for the next snapshot. `None` once cancelled or terminated.
    pub async fn next_snapshot(&mut self) -> Option<Result<Vec<Message>>> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Stop the subscription. Snapshots already buffered are discarded and
    /// nothing is yielded afterwards, even if matching messages are written.
    pub fn cancel(&mut self) {
        if self.rx.take().is_some() {
            self.task.abort();
            info!(filter = ?self.filter, "subscription cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.is_none()
    }

    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }
}

impl Stream for Subscription {
    type Item = Result<Vec<Message>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().rx.as_mut() {
            Some(rx) => rx.poll_recv(cx),
            None => Poll::Ready(None),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use futures::StreamExt;
    use helpchain_shared::{MessageId, MessageKind, UserId};
    use helpchain_store::{
        BatchAction, MessageBackend, NewMessage, SqliteBackend, StoreError, UserProfile,
    };
    use tokio::sync::watch;
    use tokio::time::timeout;

    use super::*;
    use crate::error::ErrorKind;

    /// Backend whose every call fails as an unavailable store would.
    struct UnavailableBackend {
        revision: watch::Sender<u64>,
    }

    impl UnavailableBackend {
        fn new() -> Self {
            Self {
                revision: watch::channel(0).0,
            }
        }
    }

    impl MessageBackend for UnavailableBackend {
        fn insert_message(&self, _: &NewMessage) -> helpchain_store::Result<Message> {
            Err(StoreError::Poisoned)
        }

        fn get_message(&self, _: MessageId) -> helpchain_store::Result<Message> {
            Err(StoreError::Poisoned)
        }

        fn query_messages(&self, _: &MessageFilter) -> helpchain_store::Result<Vec<Message>> {
            Err(StoreError::Poisoned)
        }

        fn set_read(&self, _: MessageId, _: bool) -> helpchain_store::Result<()> {
            Err(StoreError::Poisoned)
        }

        fn delete_message(&self, _: MessageId) -> helpchain_store::Result<()> {
            Err(StoreError::Poisoned)
        }

        fn apply_batch(&self, _: &[MessageId], _: BatchAction) -> helpchain_store::Result<usize> {
            Err(StoreError::Poisoned)
        }

        fn list_users(&self) -> helpchain_store::Result<Vec<UserProfile>> {
            Err(StoreError::Poisoned)
        }

        fn upsert_user(&self, _: &UserProfile) -> helpchain_store::Result<()> {
            Err(StoreError::Poisoned)
        }

        fn watch_revision(&self) -> watch::Receiver<u64> {
            self.revision.subscribe()
        }
    }

    fn draft(from: &str, to: &str) -> NewMessage {
        NewMessage {
            from_user_id: UserId::from(from),
            from_user_name: String::new(),
            to_user_id: UserId::from(to),
            to_user_name: String::new(),
            subject_id: None,
            content: "ping".into(),
            kind: MessageKind::Plain,
            meeting_details: None,
            created_at: Utc::now(),
        }
    }

    fn message_at(secs: i64, id: MessageId) -> Message {
        Message {
            id,
            from_user_id: UserId::from("a"),
            from_user_name: String::new(),
            to_user_id: UserId::from("b"),
            to_user_name: String::new(),
            subject_id: None,
            content: "x".into(),
            kind: MessageKind::Plain,
            meeting_details: None,
            is_read: false,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_sort_orders() {
        let mut ids = [MessageId::new(), MessageId::new()];
        ids.sort();
        let mut messages = vec![
            message_at(20, ids[0]),
            message_at(10, ids[1]),
            message_at(10, ids[0]),
        ];

        SnapshotOrder::OldestFirst.sort(&mut messages);
        let keys: Vec<_> = messages.iter().map(|m| (m.created_at.timestamp(), m.id)).collect();
        assert_eq!(keys, vec![(10, ids[0]), (10, ids[1]), (20, ids[0])]);

        SnapshotOrder::NewestFirst.sort(&mut messages);
        assert_eq!(messages[0].created_at.timestamp(), 20);
    }

    #[tokio::test]
    async fn test_initial_and_follow_up_snapshots() {
        let backend: SharedBackend = Arc::new(SqliteBackend::in_memory().unwrap());
        let mut sub = Subscription::spawn(
            backend.clone(),
            MessageFilter::To(UserId::from("b")),
            SnapshotOrder::OldestFirst,
            8,
        );

        let initial = sub.next().await.unwrap().unwrap();
        assert!(initial.is_empty());

        backend.insert_message(&draft("a", "b")).unwrap();
        let next = timeout(Duration::from_secs(5), sub.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(next.len(), 1);
    }

    #[tokio::test]
    async fn test_unrelated_writes_produce_no_snapshot() {
        let backend: SharedBackend = Arc::new(SqliteBackend::in_memory().unwrap());
        let mut sub = Subscription::spawn(
            backend.clone(),
            MessageFilter::To(UserId::from("b")),
            SnapshotOrder::OldestFirst,
            8,
        );
        sub.next().await.unwrap().unwrap();

        backend.insert_message(&draft("a", "c")).unwrap();
        assert!(timeout(Duration::from_millis(200), sub.next()).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let backend: SharedBackend = Arc::new(SqliteBackend::in_memory().unwrap());
        let mut sub = Subscription::spawn(
            backend.clone(),
            MessageFilter::To(UserId::from("b")),
            SnapshotOrder::OldestFirst,
            8,
        );
        sub.next().await.unwrap().unwrap();

        sub.cancel();
        assert!(sub.is_cancelled());

        backend.insert_message(&draft("a", "b")).unwrap();
        assert!(sub.next().await.is_none());
        assert!(sub.next_snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_the_last_item() {
        let backend: SharedBackend = Arc::new(UnavailableBackend::new());
        let mut sub = Subscription::spawn(
            backend,
            MessageFilter::To(UserId::from("b")),
            SnapshotOrder::NewestFirst,
            8,
        );

        let err = timeout(Duration::from_secs(5), sub.next())
            .await
            .unwrap()
            .expect("error item")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.is_retryable());

        let end = timeout(Duration::from_secs(5), sub.next()).await.unwrap();
        assert!(end.is_none());
    }
}
