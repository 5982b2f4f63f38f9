//! # helpchain-inbox
//!
//! Follows one user's inbound message stream and logs the unread index on
//! every snapshot. Configuration comes from the environment (see
//! `MessagingConfig`); `RUST_LOG` controls verbosity.

use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use helpchain_messaging::{
    compute_unread_index, ConversationStore, MessagingConfig, SharedBackend, UserDirectory,
};
use helpchain_store::SqliteBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,helpchain_messaging=debug")),
        )
        .init();

    info!("Starting HelpChain inbox v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = MessagingConfig::from_env();
    info!(?config, "Loaded configuration");

    let user = config
        .user_id
        .clone()
        .context("HELPCHAIN_USER_ID must name the user whose inbox to follow")?;

    // -----------------------------------------------------------------------
    // 3. Open the store and watch for writes from other processes
    // -----------------------------------------------------------------------
    let sqlite = Arc::new(SqliteBackend::new(
        config.open_database().context("failed to open database")?,
    ));
    let poller = sqlite.spawn_change_poller(config.poll_interval);
    let backend: SharedBackend = sqlite;

    let directory = UserDirectory::load(&backend).await?;
    let store = ConversationStore::new(backend, &config);

    // -----------------------------------------------------------------------
    // 4. Follow the inbound stream until Ctrl+C
    // -----------------------------------------------------------------------
    let mut inbound = store.subscribe_inbound(&user);
    info!(user = %user, name = %directory.display_name(&user), "Following inbox");

    loop {
        tokio::select! {
            item = inbound.next() => match item {
                Some(Ok(snapshot)) => {
                    let index = compute_unread_index(&snapshot);
                    info!(
                        messages = snapshot.len(),
                        unread = index.total(),
                        "Inbox updated"
                    );
                    for (sender, count) in index.iter() {
                        info!(from = %directory.display_name(sender), sender = %sender, count, "Unread");
                    }
                }
                Some(Err(e)) => {
                    poller.abort();
                    return Err(e).context("inbox subscription terminated");
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    inbound.cancel();
    poller.abort();
    Ok(())
}
