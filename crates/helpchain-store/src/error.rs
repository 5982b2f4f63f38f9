use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The targeted message does not exist (never existed or already deleted).
    #[error("Message not found: {0}")]
    MessageNotFound(Uuid),

    /// A batch referenced messages that do not exist; nothing was applied.
    #[error("Batch rejected, {} message(s) not found", .0.len())]
    BatchMissing(Vec<Uuid>),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// Embedded JSON (meeting details) could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored `type` value is not one of the known categories.
    #[error("Unknown message type: {0}")]
    UnknownKind(String),

    /// The connection mutex was poisoned by a panicking writer.
    #[error("Database lock poisoned")]
    Poisoned,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
