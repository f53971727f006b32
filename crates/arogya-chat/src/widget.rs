//! Assistant widget state machine.
//!
//! Valid transitions:
//! - Closed -> Opening (open the widget)
//! - Opening -> Idle (conversation ready, welcome shown)
//! - Opening -> Closed (conversation could not be created)
//! - Idle -> Sending (non-blank message submitted)
//! - Sending -> Idle (turn finished, successfully or not)
//! - any -> Closed (close the widget)
//!
//! A blank submit while Idle is a no-op. Anything else is rejected.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arogya_core::types::Sender;

use crate::error::ChatError;

/// Visible state of the assistant widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    /// Widget hidden.
    Closed,
    /// Waiting for the conversation record to be created.
    Opening,
    /// Ready for input.
    Idle,
    /// A turn is being recorded; input is locked.
    Sending,
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetState::Closed => write!(f, "Closed"),
            WidgetState::Opening => write!(f, "Opening"),
            WidgetState::Idle => write!(f, "Idle"),
            WidgetState::Sending => write!(f, "Sending"),
        }
    }
}

/// Inputs to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    Open,
    ConversationReady(Uuid),
    OpenFailed,
    Submit(String),
    TurnComplete(String),
    TurnFailed(String),
    Close,
}

impl WidgetEvent {
    fn name(&self) -> &'static str {
        match self {
            WidgetEvent::Open => "Open",
            WidgetEvent::ConversationReady(_) => "ConversationReady",
            WidgetEvent::OpenFailed => "OpenFailed",
            WidgetEvent::Submit(_) => "Submit",
            WidgetEvent::TurnComplete(_) => "TurnComplete",
            WidgetEvent::TurnFailed(_) => "TurnFailed",
            WidgetEvent::Close => "Close",
        }
    }
}

impl WidgetState {
    /// Returns whether `event` is accepted in this state.
    pub fn accepts(&self, event: &WidgetEvent) -> bool {
        matches!(
            (self, event),
            (WidgetState::Closed, WidgetEvent::Open)
                | (WidgetState::Opening, WidgetEvent::ConversationReady(_))
                | (WidgetState::Opening, WidgetEvent::OpenFailed)
                | (WidgetState::Idle, WidgetEvent::Submit(_))
                | (WidgetState::Sending, WidgetEvent::TurnComplete(_))
                | (WidgetState::Sending, WidgetEvent::TurnFailed(_))
                | (_, WidgetEvent::Close)
        )
    }
}

/// One line in the on-screen transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Set on the bot entry shown in place of a reply when a turn failed.
    #[serde(default)]
    pub is_error: bool,
}

impl TranscriptEntry {
    fn new(sender: Sender, text: impl Into<String>, is_error: bool) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
            is_error,
        }
    }
}

/// The widget: current state, bound conversation, and transcript.
///
/// The transcript and conversation survive close/reopen; the welcome entry
/// is only added when the transcript is empty.
#[derive(Debug, Clone)]
pub struct AssistantWidget {
    state: WidgetState,
    conversation_id: Option<Uuid>,
    transcript: Vec<TranscriptEntry>,
    welcome_message: String,
}

impl AssistantWidget {
    pub fn new(welcome_message: impl Into<String>) -> Self {
        Self {
            state: WidgetState::Closed,
            conversation_id: None,
            transcript: Vec::new(),
            welcome_message: welcome_message.into(),
        }
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn conversation_id(&self) -> Option<Uuid> {
        self.conversation_id
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Apply an event and return the resulting state.
    pub fn apply(&mut self, event: WidgetEvent) -> Result<WidgetState, ChatError> {
        if !self.state.accepts(&event) {
            return Err(ChatError::InvalidTransition {
                state: self.state.to_string(),
                event: event.name().to_string(),
            });
        }

        let from = self.state;
        match event {
            WidgetEvent::Open => self.state = WidgetState::Opening,
            WidgetEvent::ConversationReady(id) => {
                self.conversation_id = Some(id);
                if self.transcript.is_empty() {
                    self.transcript
                        .push(TranscriptEntry::new(Sender::Bot, self.welcome_message.clone(), false));
                }
                self.state = WidgetState::Idle;
            }
            WidgetEvent::OpenFailed => self.state = WidgetState::Closed,
            WidgetEvent::Submit(text) => {
                if text.trim().is_empty() {
                    return Ok(self.state);
                }
                self.transcript
                    .push(TranscriptEntry::new(Sender::User, text, false));
                self.state = WidgetState::Sending;
            }
            WidgetEvent::TurnComplete(reply) => {
                self.transcript
                    .push(TranscriptEntry::new(Sender::Bot, reply, false));
                self.state = WidgetState::Idle;
            }
            WidgetEvent::TurnFailed(notice) => {
                self.transcript
                    .push(TranscriptEntry::new(Sender::Bot, notice, true));
                self.state = WidgetState::Idle;
            }
            WidgetEvent::Close => self.state = WidgetState::Closed,
        }

        if from != self.state {
            tracing::debug!("Widget state: {} -> {}", from, self.state);
        }
        Ok(self.state)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const WELCOME: &str = "Hello! I'm your health assistant. How can I help you today?";

    fn all_events() -> Vec<WidgetEvent> {
        vec![
            WidgetEvent::Open,
            WidgetEvent::ConversationReady(Uuid::new_v4()),
            WidgetEvent::OpenFailed,
            WidgetEvent::Submit("fever".to_string()),
            WidgetEvent::TurnComplete("reply".to_string()),
            WidgetEvent::TurnFailed("notice".to_string()),
            WidgetEvent::Close,
        ]
    }

    fn widget_in(state: WidgetState) -> AssistantWidget {
        let mut w = AssistantWidget::new(WELCOME);
        match state {
            WidgetState::Closed => {}
            WidgetState::Opening => {
                w.apply(WidgetEvent::Open).unwrap();
            }
            WidgetState::Idle => {
                w.apply(WidgetEvent::Open).unwrap();
                w.apply(WidgetEvent::ConversationReady(Uuid::new_v4())).unwrap();
            }
            WidgetState::Sending => {
                w.apply(WidgetEvent::Open).unwrap();
                w.apply(WidgetEvent::ConversationReady(Uuid::new_v4())).unwrap();
                w.apply(WidgetEvent::Submit("cough".to_string())).unwrap();
            }
        }
        assert_eq!(w.state(), state);
        w
    }

    #[test]
    fn test_state_display() {
        assert_eq!(WidgetState::Closed.to_string(), "Closed");
        assert_eq!(WidgetState::Opening.to_string(), "Opening");
        assert_eq!(WidgetState::Idle.to_string(), "Idle");
        assert_eq!(WidgetState::Sending.to_string(), "Sending");
    }

    #[test]
    fn test_happy_path() {
        let mut w = AssistantWidget::new(WELCOME);
        let id = Uuid::new_v4();

        assert_eq!(w.apply(WidgetEvent::Open).unwrap(), WidgetState::Opening);
        assert_eq!(
            w.apply(WidgetEvent::ConversationReady(id)).unwrap(),
            WidgetState::Idle
        );
        assert_eq!(w.conversation_id(), Some(id));
        assert_eq!(w.transcript().len(), 1);
        assert_eq!(w.transcript()[0].text, WELCOME);
        assert_eq!(w.transcript()[0].sender, Sender::Bot);

        assert_eq!(
            w.apply(WidgetEvent::Submit("fever".to_string())).unwrap(),
            WidgetState::Sending
        );
        assert_eq!(w.transcript()[1].sender, Sender::User);

        assert_eq!(
            w.apply(WidgetEvent::TurnComplete("get rest".to_string())).unwrap(),
            WidgetState::Idle
        );
        assert_eq!(w.transcript().len(), 3);
        assert!(!w.transcript()[2].is_error);

        assert_eq!(w.apply(WidgetEvent::Close).unwrap(), WidgetState::Closed);
    }

    #[test]
    fn test_open_failed_returns_to_closed() {
        let mut w = widget_in(WidgetState::Opening);
        assert_eq!(w.apply(WidgetEvent::OpenFailed).unwrap(), WidgetState::Closed);
        assert!(w.conversation_id().is_none());
        assert!(w.transcript().is_empty());
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut w = widget_in(WidgetState::Idle);
        let before = w.transcript().len();
        for text in ["", "  ", "\t\n"] {
            assert_eq!(
                w.apply(WidgetEvent::Submit(text.to_string())).unwrap(),
                WidgetState::Idle
            );
        }
        assert_eq!(w.transcript().len(), before);
    }

    #[test]
    fn test_turn_failed_appends_error_entry() {
        let mut w = widget_in(WidgetState::Sending);
        w.apply(WidgetEvent::TurnFailed("Failed to send message".to_string()))
            .unwrap();
        assert_eq!(w.state(), WidgetState::Idle);
        let last = w.transcript().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert!(last.is_error);
        assert_eq!(last.text, "Failed to send message");
    }

    #[test]
    fn test_submit_rejected_while_sending() {
        let mut w = widget_in(WidgetState::Sending);
        let before = w.transcript().len();
        let err = w
            .apply(WidgetEvent::Submit("again".to_string()))
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidTransition { .. }));
        assert_eq!(err.to_string(), "invalid transition: Submit while Sending");
        assert_eq!(w.state(), WidgetState::Sending);
        assert_eq!(w.transcript().len(), before);
    }

    #[test]
    fn test_close_from_every_state() {
        for state in [
            WidgetState::Closed,
            WidgetState::Opening,
            WidgetState::Idle,
            WidgetState::Sending,
        ] {
            let mut w = widget_in(state);
            assert_eq!(w.apply(WidgetEvent::Close).unwrap(), WidgetState::Closed);
        }
    }

    #[test]
    fn test_every_unlisted_pair_is_rejected() {
        let states = [
            WidgetState::Closed,
            WidgetState::Opening,
            WidgetState::Idle,
            WidgetState::Sending,
        ];
        for state in states {
            for event in all_events() {
                let expected = state.accepts(&event);
                let mut w = widget_in(state);
                let result = w.apply(event.clone());
                assert_eq!(
                    result.is_ok(),
                    expected,
                    "{} + {:?} should be {}",
                    state,
                    event,
                    if expected { "accepted" } else { "rejected" }
                );
                if !expected {
                    assert_eq!(w.state(), state, "rejected event must not change state");
                }
            }
        }

        // Spot-check the table itself.
        assert!(!WidgetState::Closed.accepts(&WidgetEvent::Submit("x".to_string())));
        assert!(!WidgetState::Opening.accepts(&WidgetEvent::Submit("x".to_string())));
        assert!(!WidgetState::Idle.accepts(&WidgetEvent::Open));
        assert!(!WidgetState::Idle.accepts(&WidgetEvent::TurnComplete("x".to_string())));
        assert!(!WidgetState::Sending.accepts(&WidgetEvent::Open));
        assert!(!WidgetState::Closed.accepts(&WidgetEvent::OpenFailed));
    }

    #[test]
    fn test_reopen_keeps_transcript_without_second_welcome() {
        let mut w = widget_in(WidgetState::Idle);
        let id = w.conversation_id().unwrap();
        w.apply(WidgetEvent::Close).unwrap();
        w.apply(WidgetEvent::Open).unwrap();
        w.apply(WidgetEvent::ConversationReady(id)).unwrap();
        assert_eq!(w.transcript().len(), 1);
        assert_eq!(w.conversation_id(), Some(id));
    }
}
