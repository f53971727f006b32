//! Health assistant for Arogya.
//!
//! Provides the keyword-driven responder, the turn recorder that persists
//! each exchange, and the widget state machine that serializes turns.

pub mod error;
pub mod recorder;
pub mod responder;
pub mod session;
pub mod widget;

pub use error::ChatError;
pub use recorder::{ConversationRecorder, TurnOutcome, TurnStep};
pub use responder::{KeywordRule, ReplyTopic, RuleBasedResponder};
pub use session::AssistantSession;
pub use widget::{AssistantWidget, TranscriptEntry, WidgetEvent, WidgetState};
