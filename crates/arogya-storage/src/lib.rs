//! Arogya Storage crate - SQLite persistence for the health assistant.
//!
//! Provides a WAL-mode SQLite database with migrations, repositories for
//! conversations, messages and the query audit log, the [`AssistantStore`]
//! seam used by the turn recorder, and the read-only feed queries behind
//! the list screens.

pub mod db;
pub mod feeds;
pub mod migrations;
pub mod repository;
pub mod store;

pub use db::Database;
pub use feeds::{FeedImport, FeedRepository};
pub use repository::{ConversationRepository, MessageRepository, QueryLogRepository};
pub use store::{AssistantStore, SqliteStore};
