//! The store contract consumed by the messaging core, and its SQLite
//! implementation.
//!
//! A backend is constructed explicitly and injected into the core, so
//! several independent stores (or test doubles) can coexist in one process.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use helpchain_shared::MessageId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{BatchAction, Message, MessageFilter, NewMessage, UserProfile};

/// Operations the messaging core needs from a document store.
///
/// All methods block; async callers run them on a blocking thread.
pub trait MessageBackend: Send + Sync {
    /// Write a new message; the store assigns its id.
    fn insert_message(&self, message: &NewMessage) -> Result<Message>;

    fn get_message(&self, id: MessageId) -> Result<Message>;

    /// Every message matching `filter`.
    fn query_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>>;

    /// Set the read flag of one message.
    fn set_read(&self, id: MessageId, is_read: bool) -> Result<()>;

    /// Permanently delete one message.
    fn delete_message(&self, id: MessageId) -> Result<()>;

    /// Apply one action to all `ids` atomically: all or nothing.
    fn apply_batch(&self, ids: &[MessageId], action: BatchAction) -> Result<usize>;

    fn list_users(&self) -> Result<Vec<UserProfile>>;

    fn upsert_user(&self, user: &UserProfile) -> Result<()>;

    /// Revision counter that increases after every committed message write.
    /// Live subscriptions re-query whenever it changes.
    fn watch_revision(&self) -> watch::Receiver<u64>;
}

/// [`MessageBackend`] over a single SQLite [`Database`].
pub struct SqliteBackend {
    db: Mutex<Database>,
    revision: watch::Sender<u64>,
    /// Last `PRAGMA data_version` seen; changes when another connection commits.
    data_version: AtomicI64,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        let (revision, _) = watch::channel(0);
        let data_version = read_data_version(&db).unwrap_or_default();
        Self {
            db: Mutex::new(db),
            revision,
            data_version: AtomicI64::new(data_version),
        }
    }

    /// Convenience constructor over a fresh in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| StoreError::Poisoned)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
        debug!(revision = *self.revision.borrow(), "store revision advanced");
    }

    /// Advance the revision if another connection (another process sharing
    /// the database file) committed since the last check.
    pub fn check_external_changes(&self) -> Result<bool> {
        let db = self.lock()?;
        let version = read_data_version(&db)?;
        drop(db);
        let previous = self.data_version.swap(version, Ordering::SeqCst);
        if previous != version {
            self.bump();
            return Ok(true);
        }
        Ok(false)
    }

    /// Poll for commits made through other connections every `interval`.
    ///
    /// The task stops on its own once the backend is dropped everywhere else.
    pub fn spawn_change_poller(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(backend) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = backend.check_external_changes() {
                    warn!(error = %e, "failed to poll for external changes");
                }
            }
        })
    }
}

fn read_data_version(db: &Database) -> Result<i64> {
    Ok(db
        .conn()
        .pragma_query_value(None, "data_version", |row| row.get(0))?)
}

impl MessageBackend for SqliteBackend {
    fn insert_message(&self, message: &NewMessage) -> Result<Message> {
        let stored = self.lock()?.insert_message(message)?;
        self.bump();
        Ok(stored)
    }

    fn get_message(&self, id: MessageId) -> Result<Message> {
        self.lock()?.get_message(id)
    }

    fn query_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>> {
        self.lock()?.query_messages(filter)
    }

    fn set_read(&self, id: MessageId, is_read: bool) -> Result<()> {
        self.lock()?.set_message_read(id, is_read)?;
        self.bump();
        Ok(())
    }

    fn delete_message(&self, id: MessageId) -> Result<()> {
        self.lock()?.delete_message(id)?;
        self.bump();
        Ok(())
    }

    fn apply_batch(&self, ids: &[MessageId], action: BatchAction) -> Result<usize> {
        let touched = self.lock()?.apply_batch(ids, action)?;
        if touched > 0 {
            self.bump();
        }
        Ok(touched)
    }

    fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.lock()?.list_users()
    }

    fn upsert_user(&self, user: &UserProfile) -> Result<()> {
        self.lock()?.upsert_user(user)
    }

    fn watch_revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
