//! # helpchain-store
//!
//! Document store for HelpChain messages and user profiles, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle with typed CRUD
//! helpers, and [`SqliteBackend`], a thread-safe wrapper implementing the
//! [`MessageBackend`] contract the messaging core is written against:
//! filtered queries, single-record writes, atomic batches and a revision
//! feed that ticks after every committed write.

pub mod backend;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use backend::{MessageBackend, SqliteBackend};
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
