//! Turn recorder: sequences the persistence writes of a conversation.
//!
//! One write opens a conversation. Each user turn then performs, strictly
//! in order: user message insert, pending audit insert, reply computation,
//! bot message insert, audit update by row ID. There is no enclosing
//! transaction; a failure part-way leaves the earlier writes in place and is
//! reported as a [`TurnOutcome::PartialFailure`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use arogya_core::config::AssistantConfig;
use arogya_core::error::ArogyaError;
use arogya_core::types::Sender;
use arogya_storage::AssistantStore;

use crate::error::ChatError;
use crate::responder::RuleBasedResponder;

/// A single persistence step within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStep {
    UserMessage,
    AuditInsert,
    BotMessage,
    AuditUpdate,
}

impl fmt::Display for TurnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnStep::UserMessage => write!(f, "user message insert"),
            TurnStep::AuditInsert => write!(f, "audit insert"),
            TurnStep::BotMessage => write!(f, "bot message insert"),
            TurnStep::AuditUpdate => write!(f, "audit update"),
        }
    }
}

/// Result of one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// All four writes landed.
    Completed { reply: String, log_id: Uuid },
    /// At least one write landed before `failed` errored. Earlier writes are
    /// not rolled back.
    PartialFailure {
        reply: Option<String>,
        completed: Vec<TurnStep>,
        failed: TurnStep,
        error: String,
    },
    /// The first write failed; nothing was persisted.
    Failed { step: TurnStep, error: String },
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }

    /// The computed reply, when the turn got far enough to produce one.
    pub fn reply(&self) -> Option<&str> {
        match self {
            TurnOutcome::Completed { reply, .. } => Some(reply),
            TurnOutcome::PartialFailure { reply, .. } => reply.as_deref(),
            TurnOutcome::Failed { .. } => None,
        }
    }
}

/// Drives an [`AssistantStore`] through the writes of each turn.
pub struct ConversationRecorder {
    store: Arc<dyn AssistantStore>,
    responder: RuleBasedResponder,
    config: AssistantConfig,
}

impl ConversationRecorder {
    pub fn new(
        store: Arc<dyn AssistantStore>,
        responder: RuleBasedResponder,
        config: AssistantConfig,
    ) -> Self {
        Self {
            store,
            responder,
            config,
        }
    }

    /// Build a recorder whose responder comes from `config.rules_path`, or
    /// the built-in table when no path is set.
    pub fn from_config(
        store: Arc<dyn AssistantStore>,
        config: AssistantConfig,
    ) -> Result<Self, ChatError> {
        let responder = RuleBasedResponder::from_config(&config)?;
        Ok(Self::new(store, responder, config))
    }

    pub fn responder(&self) -> &RuleBasedResponder {
        &self.responder
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Check a message before any write is attempted.
    pub fn validate(&self, text: &str) -> Result<(), ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }
        Ok(())
    }

    /// Create the conversation record for a new widget session.
    pub async fn open_conversation(&self, user_id: &str) -> Result<Uuid, ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        let conversation = self
            .store
            .create_conversation(user_id, &self.config.channel)
            .await
            .map_err(|e| {
                warn!(user_id, error = %e, "Failed to create conversation");
                ChatError::ConversationUnavailable(e.to_string())
            })?;
        info!(conversation_id = %conversation.id, user_id, "Conversation opened");
        Ok(conversation.id)
    }

    /// Record one user turn and return what happened.
    ///
    /// Validation errors are returned as `Err` with no write performed.
    /// Storage failures are reported through the returned [`TurnOutcome`].
    pub async fn send_turn(
        &self,
        conversation_id: Uuid,
        user_id: &str,
        text: &str,
    ) -> Result<TurnOutcome, ChatError> {
        self.validate(text)?;

        let mut completed = Vec::with_capacity(4);

        if let Err(e) = self
            .store
            .append_message(conversation_id, Sender::User, text)
            .await
        {
            return Ok(failure(TurnStep::UserMessage, None, completed, e));
        }
        completed.push(TurnStep::UserMessage);

        let log_id = match self
            .store
            .insert_query_log(user_id, text, &self.config.pending_response)
            .await
        {
            Ok(entry) => entry.id,
            Err(e) => return Ok(failure(TurnStep::AuditInsert, None, completed, e)),
        };
        completed.push(TurnStep::AuditInsert);

        let (topic, reply) = self.responder.respond_with_topic(text);

        if let Err(e) = self
            .store
            .append_message(conversation_id, Sender::Bot, &reply)
            .await
        {
            return Ok(failure(TurnStep::BotMessage, Some(reply), completed, e));
        }
        completed.push(TurnStep::BotMessage);

        if let Err(e) = self.store.update_query_log_response(log_id, &reply).await {
            return Ok(failure(TurnStep::AuditUpdate, Some(reply), completed, e));
        }

        info!(
            conversation_id = %conversation_id,
            user_id,
            log_id = %log_id,
            topic = %topic,
            "Turn recorded"
        );
        Ok(TurnOutcome::Completed { reply, log_id })
    }
}

fn failure(
    step: TurnStep,
    reply: Option<String>,
    completed: Vec<TurnStep>,
    error: ArogyaError,
) -> TurnOutcome {
    warn!(
        step = %step,
        completed = completed.len(),
        error = %error,
        "Turn write failed"
    );
    if completed.is_empty() {
        TurnOutcome::Failed {
            step,
            error: error.to_string(),
        }
    } else {
        TurnOutcome::PartialFailure {
            reply,
            completed,
            failed: step,
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use arogya_core::types::{Conversation, ConversationStatus, Message, QueryLogEntry};
    use arogya_storage::{Database, MessageRepository, QueryLogRepository, SqliteStore};

    use crate::responder::{COUGH_COLD_REPLY, HEADACHE_REPLY};

    /// In-memory store that records every call and can be told to fail a
    /// given step.
    #[derive(Default)]
    pub(crate) struct ScriptedStore {
        pub fail_create: bool,
        pub fail_on: Option<TurnStep>,
        pub calls: Mutex<Vec<String>>,
    }

    impl ScriptedStore {
        pub fn failing_at(step: TurnStep) -> Self {
            Self {
                fail_on: Some(step),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, step: Option<TurnStep>, call: &str) -> Result<(), ArogyaError> {
            if step.is_some() && step == self.fail_on {
                return Err(ArogyaError::Storage(format!("{} rejected", call)));
            }
            self.calls.lock().unwrap().push(call.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl AssistantStore for ScriptedStore {
        async fn create_conversation(
            &self,
            user_id: &str,
            channel: &str,
        ) -> Result<Conversation, ArogyaError> {
            if self.fail_create {
                return Err(ArogyaError::Storage("network down".to_string()));
            }
            self.record(None, "create_conversation")?;
            Ok(Conversation {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                channel: channel.to_string(),
                status: ConversationStatus::Active,
                created_at: Utc::now(),
            })
        }

        async fn append_message(
            &self,
            conversation_id: Uuid,
            sender: Sender,
            text: &str,
        ) -> Result<Message, ArogyaError> {
            let step = match sender {
                Sender::User => TurnStep::UserMessage,
                Sender::Bot => TurnStep::BotMessage,
            };
            self.record(Some(step), &format!("append_message:{}", sender.as_str()))?;
            Ok(Message {
                id: Uuid::new_v4(),
                conversation_id,
                sender,
                text: text.to_string(),
                created_at: Utc::now(),
            })
        }

        async fn insert_query_log(
            &self,
            user_id: &str,
            query: &str,
            response: &str,
        ) -> Result<QueryLogEntry, ArogyaError> {
            self.record(Some(TurnStep::AuditInsert), "insert_query_log")?;
            Ok(QueryLogEntry {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                query: query.to_string(),
                response: response.to_string(),
                created_at: Utc::now(),
            })
        }

        async fn update_query_log_response(
            &self,
            _id: Uuid,
            _response: &str,
        ) -> Result<(), ArogyaError> {
            self.record(Some(TurnStep::AuditUpdate), "update_query_log_response")
        }
    }

    fn recorder_with(store: Arc<dyn AssistantStore>) -> ConversationRecorder {
        ConversationRecorder::new(
            store,
            RuleBasedResponder::default(),
            AssistantConfig::default(),
        )
    }

    fn sqlite_recorder() -> (Arc<Database>, ConversationRecorder) {
        let db = Arc::new(Database::in_memory().unwrap());
        let store = Arc::new(SqliteStore::new(Arc::clone(&db)));
        (db, recorder_with(store))
    }

    #[tokio::test]
    async fn test_turn_writes_in_order() {
        let store = Arc::new(ScriptedStore::default());
        let recorder = recorder_with(store.clone());

        let conversation_id = recorder.open_conversation("u1").await.unwrap();
        let outcome = recorder
            .send_turn(conversation_id, "u1", "bad cough")
            .await
            .unwrap();

        assert_eq!(outcome.reply(), Some(COUGH_COLD_REPLY));
        assert!(outcome.is_completed());
        assert_eq!(
            store.calls(),
            vec![
                "create_conversation",
                "append_message:user",
                "insert_query_log",
                "append_message:bot",
                "update_query_log_response",
            ]
        );
    }

    #[tokio::test]
    async fn test_headache_and_cold_end_to_end() {
        let (db, recorder) = sqlite_recorder();
        let conversation_id = recorder.open_conversation("u1").await.unwrap();

        let outcome = recorder
            .send_turn(conversation_id, "u1", "I have a headache and cold")
            .await
            .unwrap();

        let TurnOutcome::Completed { reply, log_id } = outcome else {
            panic!("expected completed turn, got {:?}", outcome);
        };
        assert_eq!(reply, HEADACHE_REPLY);

        let logs = QueryLogRepository::new(Arc::clone(&db));
        let entry = logs.find_by_id(log_id).unwrap().unwrap();
        assert_eq!(entry.query, "I have a headache and cold");
        assert_eq!(entry.response, HEADACHE_REPLY);

        let messages = MessageRepository::new(db)
            .list_for_conversation(conversation_id)
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "I have a headache and cold");
        assert_eq!(messages[1].sender, Sender::Bot);
        assert_eq!(messages[1].text, HEADACHE_REPLY);
    }

    #[tokio::test]
    async fn test_repeated_identical_query_updates_each_own_row() {
        let (db, recorder) = sqlite_recorder();
        let conversation_id = recorder.open_conversation("u1").await.unwrap();

        let first = recorder
            .send_turn(conversation_id, "u1", "fever")
            .await
            .unwrap();
        let second = recorder
            .send_turn(conversation_id, "u1", "fever")
            .await
            .unwrap();

        let (
            TurnOutcome::Completed { log_id: first_id, .. },
            TurnOutcome::Completed { log_id: second_id, .. },
        ) = (first, second)
        else {
            panic!("both turns should complete");
        };
        assert_ne!(first_id, second_id);

        let logs = QueryLogRepository::new(db);
        let entries = logs.list_for_user("u1", 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| e.response != AssistantConfig::default().pending_response));
    }

    #[tokio::test]
    async fn test_blank_message_performs_no_write() {
        let store = Arc::new(ScriptedStore::default());
        let recorder = recorder_with(store.clone());

        for text in ["", "   ", "\n\t"] {
            let err = recorder
                .send_turn(Uuid::new_v4(), "u1", text)
                .await
                .unwrap_err();
            assert!(matches!(err, ChatError::EmptyMessage));
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_over_length_message_performs_no_write() {
        let store = Arc::new(ScriptedStore::default());
        let config = AssistantConfig {
            max_message_length: 5,
            ..Default::default()
        };
        let recorder = ConversationRecorder::new(store.clone(), RuleBasedResponder::default(), config);

        let err = recorder
            .send_turn(Uuid::new_v4(), "u1", "fever!")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::MessageTooLong(5)));
        assert!(store.calls().is_empty());

        // Length counts characters, not bytes.
        assert!(recorder.validate("बुखार").is_ok());
    }

    #[tokio::test]
    async fn test_disabled_assistant_rejects_everything() {
        let store = Arc::new(ScriptedStore::default());
        let config = AssistantConfig {
            enabled: false,
            ..Default::default()
        };
        let recorder = ConversationRecorder::new(store.clone(), RuleBasedResponder::default(), config);

        assert!(matches!(
            recorder.open_conversation("u1").await,
            Err(ChatError::Disabled)
        ));
        assert!(matches!(
            recorder.send_turn(Uuid::new_v4(), "u1", "fever").await,
            Err(ChatError::Disabled)
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_is_surfaced() {
        let store = Arc::new(ScriptedStore {
            fail_create: true,
            ..Default::default()
        });
        let recorder = recorder_with(store);
        let err = recorder.open_conversation("u1").await.unwrap_err();
        assert!(matches!(err, ChatError::ConversationUnavailable(_)));
        assert!(err.to_string().contains("network down"));
    }

    #[tokio::test]
    async fn test_first_write_failure_is_total() {
        let store = Arc::new(ScriptedStore::failing_at(TurnStep::UserMessage));
        let recorder = recorder_with(store.clone());

        let outcome = recorder
            .send_turn(Uuid::new_v4(), "u1", "fever")
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::Failed {
                step: TurnStep::UserMessage,
                ..
            }
        ));
        assert!(outcome.reply().is_none());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_audit_insert_failure_is_partial() {
        let store = Arc::new(ScriptedStore::failing_at(TurnStep::AuditInsert));
        let recorder = recorder_with(store.clone());

        let outcome = recorder
            .send_turn(Uuid::new_v4(), "u1", "fever")
            .await
            .unwrap();
        match outcome {
            TurnOutcome::PartialFailure {
                reply,
                completed,
                failed,
                ..
            } => {
                assert!(reply.is_none());
                assert_eq!(completed, vec![TurnStep::UserMessage]);
                assert_eq!(failed, TurnStep::AuditInsert);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
        assert_eq!(store.calls(), vec!["append_message:user"]);
    }

    #[tokio::test]
    async fn test_bot_message_failure_keeps_reply() {
        let store = Arc::new(ScriptedStore::failing_at(TurnStep::BotMessage));
        let recorder = recorder_with(store.clone());

        let outcome = recorder
            .send_turn(Uuid::new_v4(), "u1", "headache")
            .await
            .unwrap();
        assert_eq!(outcome.reply(), Some(HEADACHE_REPLY));
        match outcome {
            TurnOutcome::PartialFailure {
                completed, failed, ..
            } => {
                assert_eq!(completed, vec![TurnStep::UserMessage, TurnStep::AuditInsert]);
                assert_eq!(failed, TurnStep::BotMessage);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
        // Audit update never attempted.
        assert!(!store
            .calls()
            .contains(&"update_query_log_response".to_string()));
    }

    #[tokio::test]
    async fn test_audit_update_failure_leaves_earlier_writes() {
        let store = Arc::new(ScriptedStore::failing_at(TurnStep::AuditUpdate));
        let recorder = recorder_with(store.clone());

        let outcome = recorder
            .send_turn(Uuid::new_v4(), "u1", "hospital")
            .await
            .unwrap();
        match outcome {
            TurnOutcome::PartialFailure {
                completed, failed, error, ..
            } => {
                assert_eq!(completed.len(), 3);
                assert_eq!(failed, TurnStep::AuditUpdate);
                assert!(error.contains("update_query_log_response rejected"));
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
        assert_eq!(store.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_from_config_loads_rules_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            "fallback = \"Ask me anything\"\n[[rules]]\ntopic = \"fever\"\nkeywords = [\"jwar\"]\nreply = \"Rest and fluids\"\n",
        )
        .unwrap();

        let config = AssistantConfig {
            rules_path: Some(path.to_string_lossy().to_string()),
            ..Default::default()
        };
        let recorder =
            ConversationRecorder::from_config(Arc::new(ScriptedStore::default()), config).unwrap();
        assert_eq!(recorder.responder().respond("JWAR"), "Rest and fluids");
        assert_eq!(recorder.responder().respond("fever"), "Ask me anything");
    }

    #[tokio::test]
    async fn test_from_config_missing_rules_file_errors() {
        let config = AssistantConfig {
            rules_path: Some("/nonexistent/rules.toml".to_string()),
            ..Default::default()
        };
        let result = ConversationRecorder::from_config(Arc::new(ScriptedStore::default()), config);
        assert!(matches!(result, Err(ChatError::RuleTable(_))));
    }
}
