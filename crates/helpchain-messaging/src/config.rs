//! Messaging configuration loaded from environment variables.
//!
//! All settings have defaults so a session can start with zero
//! configuration for local development.

use std::path::PathBuf;
use std::time::Duration;

use helpchain_shared::constants::DEFAULT_SUBSCRIPTION_BUFFER;
use helpchain_shared::UserId;
use helpchain_store::Database;

/// Messaging configuration.
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// SQLite database file.
    /// Env: `HELPCHAIN_DB_PATH`
    /// Default: the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Capacity of each subscription's snapshot channel.
    /// Env: `HELPCHAIN_SUBSCRIPTION_BUFFER`
    /// Default: `16`
    pub subscription_buffer: usize,

    /// How often to look for commits made by other processes.
    /// Env: `HELPCHAIN_POLL_INTERVAL_MS`
    /// Default: `500`
    pub poll_interval: Duration,

    /// Signed-in user for single-user tools.
    /// Env: `HELPCHAIN_USER_ID`
    /// Default: unset.
    pub user_id: Option<UserId>,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            subscription_buffer: DEFAULT_SUBSCRIPTION_BUFFER,
            poll_interval: Duration::from_millis(500),
            user_id: None,
        }
    }
}

impl MessagingConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("HELPCHAIN_DB_PATH") {
            if !path.trim().is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("HELPCHAIN_SUBSCRIPTION_BUFFER") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.subscription_buffer = n,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid HELPCHAIN_SUBSCRIPTION_BUFFER, using default"
                ),
            }
        }

        if let Some(val) = lookup("HELPCHAIN_POLL_INTERVAL_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!(
                    value = %val,
                    "Invalid HELPCHAIN_POLL_INTERVAL_MS, using default"
                ),
            }
        }

        if let Some(id) = lookup("HELPCHAIN_USER_ID") {
            if !id.trim().is_empty() {
                config.user_id = Some(UserId::new(id.trim()));
            }
        }

        config
    }

    /// Open the configured database, or the platform default.
    pub fn open_database(&self) -> helpchain_store::Result<Database> {
        match &self.db_path {
            Some(path) => Database::open_at(path),
            None => Database::new(),
        }
    }
}
