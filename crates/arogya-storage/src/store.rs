//! The write surface the assistant needs from the persistence layer.
//!
//! `AssistantStore` is the seam between the turn recorder and SQLite, so
//! the recorder can be driven against a failing or recording store in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use arogya_core::error::ArogyaError;
use arogya_core::types::{Conversation, Message, QueryLogEntry, Sender};

use crate::db::Database;
use crate::repository::{ConversationRepository, MessageRepository, QueryLogRepository};

/// Remote record store for conversations, messages, and the query audit log.
#[async_trait]
pub trait AssistantStore: Send + Sync {
    /// Create a new active conversation for `user_id`.
    async fn create_conversation(
        &self,
        user_id: &str,
        channel: &str,
    ) -> Result<Conversation, ArogyaError>;

    /// Append one message to an existing conversation.
    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender: Sender,
        text: &str,
    ) -> Result<Message, ArogyaError>;

    /// Insert an audit entry. The returned entry carries its row ID.
    async fn insert_query_log(
        &self,
        user_id: &str,
        query: &str,
        response: &str,
    ) -> Result<QueryLogEntry, ArogyaError>;

    /// Set the response of the audit entry with the given ID.
    async fn update_query_log_response(&self, id: Uuid, response: &str)
        -> Result<(), ArogyaError>;
}

/// SQLite-backed [`AssistantStore`].
pub struct SqliteStore {
    conversations: ConversationRepository,
    messages: MessageRepository,
    query_logs: QueryLogRepository,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            conversations: ConversationRepository::new(Arc::clone(&db)),
            messages: MessageRepository::new(Arc::clone(&db)),
            query_logs: QueryLogRepository::new(db),
        }
    }

    /// Set the response of the newest audit entry matching
    /// `(user_id, query, pending)`, for rows written before updates were
    /// keyed by ID. Returns the ID that was updated.
    pub fn update_query_log_by_query(
        &self,
        user_id: &str,
        query: &str,
        pending: &str,
        response: &str,
    ) -> Result<Option<Uuid>, ArogyaError> {
        self.query_logs
            .update_latest_pending_by_query(user_id, query, pending, response)
    }
}

#[async_trait]
impl AssistantStore for SqliteStore {
    async fn create_conversation(
        &self,
        user_id: &str,
        channel: &str,
    ) -> Result<Conversation, ArogyaError> {
        let conversation = self.conversations.create(user_id, channel)?;
        debug!(conversation_id = %conversation.id, user_id, "Conversation created");
        Ok(conversation)
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender: Sender,
        text: &str,
    ) -> Result<Message, ArogyaError> {
        self.messages.append(conversation_id, sender, text)
    }

    async fn insert_query_log(
        &self,
        user_id: &str,
        query: &str,
        response: &str,
    ) -> Result<QueryLogEntry, ArogyaError> {
        self.query_logs.insert(user_id, query, response)
    }

    async fn update_query_log_response(
        &self,
        id: Uuid,
        response: &str,
    ) -> Result<(), ArogyaError> {
        self.query_logs.update_response(id, response)
    }
}
