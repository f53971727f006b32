//! Error types for the health assistant.

use arogya_core::error::ArogyaError;

/// Errors from the assistant engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("assistant is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("conversation unavailable: {0}")]
    ConversationUnavailable(String),
    #[error("invalid transition: {event} while {state}")]
    InvalidTransition { state: String, event: String },
    #[error("rule table error: {0}")]
    RuleTable(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<ArogyaError> for ChatError {
    fn from(err: ArogyaError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}
