//! Runs blocking store calls off the async executor.

use helpchain_store::MessageBackend;

use crate::error::{MessagingError, Result};
use crate::SharedBackend;

/// Run `op` against the backend on tokio's blocking pool.
pub(crate) async fn run<T, F>(backend: &SharedBackend, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn MessageBackend) -> helpchain_store::Result<T> + Send + 'static,
{
    let backend = SharedBackend::clone(backend);
    tokio::task::spawn_blocking(move || op(backend.as_ref()))
        .await
        .map_err(|e| MessagingError::TransientStore(format!("store task failed: {e}")))?
        .map_err(MessagingError::from)
}
