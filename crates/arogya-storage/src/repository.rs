//! Repository implementations for the assistant tables.
//!
//! Provides ConversationRepository, MessageRepository, and
//! QueryLogRepository that operate on the Database struct using raw SQL.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use arogya_core::error::ArogyaError;
use arogya_core::types::{Conversation, ConversationStatus, Message, QueryLogEntry, Sender};

use crate::db::Database;

/// Repository for conversation sessions.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new active conversation for a user.
    pub fn create(&self, user_id: &str, channel: &str) -> Result<Conversation, ArogyaError> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            channel: channel.to_string(),
            status: ConversationStatus::Active,
            created_at: now_millis(),
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (id, user_id, channel, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    conversation.id.to_string(),
                    conversation.user_id,
                    conversation.channel,
                    conversation.status.as_str(),
                    conversation.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| ArogyaError::Storage(format!("Failed to create conversation: {}", e)))?;
            Ok(())
        })?;

        Ok(conversation)
    }

    /// Find a conversation by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, channel, status, created_at
                     FROM conversations WHERE id = ?1",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_conversation(row))
                })
                .optional()
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            result.transpose()
        })
    }

    /// Most recent conversations for a user.
    pub fn list_for_user(&self, user_id: &str, limit: u64) -> Result<Vec<Conversation>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, channel, status, created_at
                     FROM conversations
                     WHERE user_id = ?1
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?2",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    Ok(row_to_conversation(row))
                })
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let mut conversations = Vec::new();
            for row in rows {
                conversations.push(row.map_err(|e| ArogyaError::Storage(e.to_string()))??);
            }
            Ok(conversations)
        })
    }

    pub fn count(&self) -> Result<u64, ArogyaError> {
        count_table(&self.db, "conversations")
    }
}

/// Repository for the append-only message log.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a message to an existing conversation.
    ///
    /// Fails with a storage error if the conversation does not exist.
    pub fn append(
        &self,
        conversation_id: Uuid,
        sender: Sender,
        text: &str,
    ) -> Result<Message, ArogyaError> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            sender,
            text: text.to_string(),
            created_at: now_millis(),
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender, message_text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    message.id.to_string(),
                    message.conversation_id.to_string(),
                    message.sender.as_str(),
                    message.text,
                    message.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| ArogyaError::Storage(format!("Failed to save message: {}", e)))?;
            Ok(())
        })?;

        Ok(message)
    }

    /// All messages of a conversation in insertion order.
    pub fn list_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, sender, message_text, created_at
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![conversation_id.to_string()], |row| {
                    Ok(row_to_message(row))
                })
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                messages.push(row.map_err(|e| ArogyaError::Storage(e.to_string()))??);
            }
            Ok(messages)
        })
    }

    pub fn count(&self) -> Result<u64, ArogyaError> {
        count_table(&self.db, "messages")
    }
}

/// Repository for the query/response audit log (`chatbot_logs`).
pub struct QueryLogRepository {
    db: Arc<Database>,
}

impl QueryLogRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new audit entry and return it with its generated ID.
    pub fn insert(
        &self,
        user_id: &str,
        query: &str,
        response: &str,
    ) -> Result<QueryLogEntry, ArogyaError> {
        let entry = QueryLogEntry {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            query: query.to_string(),
            response: response.to_string(),
            created_at: now_millis(),
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chatbot_logs (id, user_id, query, response, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    entry.id.to_string(),
                    entry.user_id,
                    entry.query,
                    entry.response,
                    entry.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| ArogyaError::Storage(format!("Failed to save query log: {}", e)))?;
            Ok(())
        })?;

        Ok(entry)
    }

    /// Overwrite the response of the entry with the given ID.
    pub fn update_response(&self, id: Uuid, response: &str) -> Result<(), ArogyaError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE chatbot_logs SET response = ?1 WHERE id = ?2",
                    rusqlite::params![response, id.to_string()],
                )
                .map_err(|e| ArogyaError::Storage(format!("Failed to update query log: {}", e)))?;
            if changed == 0 {
                return Err(ArogyaError::NotFound(format!("query log {}", id)));
            }
            Ok(())
        })
    }

    /// Update by `(user_id, query)` value match.
    ///
    /// When the same query text is pending more than once, only the most
    /// recently inserted pending row is updated. Returns the ID of the
    /// updated row, or `None` when no pending row matched.
    pub fn update_latest_pending_by_query(
        &self,
        user_id: &str,
        query: &str,
        pending: &str,
        response: &str,
    ) -> Result<Option<Uuid>, ArogyaError> {
        self.db.with_conn(|conn| {
            let target: Option<String> = conn
                .query_row(
                    "SELECT id FROM chatbot_logs
                     WHERE user_id = ?1 AND query = ?2 AND response = ?3
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT 1",
                    rusqlite::params![user_id, query, pending],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let Some(id_str) = target else {
                return Ok(None);
            };

            conn.execute(
                "UPDATE chatbot_logs SET response = ?1 WHERE id = ?2",
                rusqlite::params![response, id_str],
            )
            .map_err(|e| ArogyaError::Storage(format!("Failed to update query log: {}", e)))?;

            Uuid::parse_str(&id_str)
                .map(Some)
                .map_err(|e| ArogyaError::Storage(format!("Invalid UUID: {}", e)))
        })
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<QueryLogEntry>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, query, response, created_at
                     FROM chatbot_logs WHERE id = ?1",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_query_log(row))
                })
                .optional()
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            result.transpose()
        })
    }

    /// Most recent audit entries for a user, newest first.
    pub fn list_for_user(&self, user_id: &str, limit: u64) -> Result<Vec<QueryLogEntry>, ArogyaError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, query, response, created_at
                     FROM chatbot_logs
                     WHERE user_id = ?1
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?2",
                )
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    Ok(row_to_query_log(row))
                })
                .map_err(|e| ArogyaError::Storage(e.to_string()))?;

            let mut entries = Vec::new();
            for row in rows {
                entries.push(row.map_err(|e| ArogyaError::Storage(e.to_string()))??);
            }
            Ok(entries)
        })
    }

    pub fn count(&self) -> Result<u64, ArogyaError> {
        count_table(&self.db, "chatbot_logs")
    }
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

fn row_to_conversation(row: &rusqlite::Row<'_>) -> Result<Conversation, ArogyaError> {
    let id_str: String = row.get(0).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let user_id: String = row.get(1).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let channel: String = row.get(2).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let status: String = row.get(3).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(4).map_err(|e| ArogyaError::Storage(e.to_string()))?;

    Ok(Conversation {
        id: parse_uuid(&id_str)?,
        user_id,
        channel,
        status: status.parse()?,
        created_at: from_millis(created_at),
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, ArogyaError> {
    let id_str: String = row.get(0).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let conversation_id: String = row.get(1).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let sender: String = row.get(2).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let text: String = row.get(3).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(4).map_err(|e| ArogyaError::Storage(e.to_string()))?;

    Ok(Message {
        id: parse_uuid(&id_str)?,
        conversation_id: parse_uuid(&conversation_id)?,
        sender: sender.parse()?,
        text,
        created_at: from_millis(created_at),
    })
}

fn row_to_query_log(row: &rusqlite::Row<'_>) -> Result<QueryLogEntry, ArogyaError> {
    let id_str: String = row.get(0).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let user_id: String = row.get(1).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let query: String = row.get(2).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let response: String = row.get(3).map_err(|e| ArogyaError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(4).map_err(|e| ArogyaError::Storage(e.to_string()))?;

    Ok(QueryLogEntry {
        id: parse_uuid(&id_str)?,
        user_id,
        query,
        response,
        created_at: from_millis(created_at),
    })
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, ArogyaError> {
    Uuid::parse_str(s).map_err(|e| ArogyaError::Storage(format!("Invalid UUID: {}", e)))
}

/// Current time truncated to the millisecond precision stored on disk.
pub(crate) fn now_millis() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis())
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

fn count_table(db: &Database, table: &str) -> Result<u64, ArogyaError> {
    db.with_conn(|conn| {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| ArogyaError::Storage(e.to_string()))?;
        Ok(count as u64)
    })
}

/// Extension trait for rusqlite to support optional query results.
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
