//! Assistant session: binds one user's widget to the turn recorder.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ChatError;
use crate::recorder::{ConversationRecorder, TurnOutcome};
use crate::widget::{AssistantWidget, TranscriptEntry, WidgetEvent, WidgetState};

/// One user's interactive session with the assistant.
pub struct AssistantSession {
    recorder: ConversationRecorder,
    widget: AssistantWidget,
    user_id: String,
}

impl AssistantSession {
    pub fn new(recorder: ConversationRecorder, user_id: impl Into<String>) -> Self {
        let widget = AssistantWidget::new(recorder.config().welcome_message.clone());
        Self {
            recorder,
            widget,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> WidgetState {
        self.widget.state()
    }

    pub fn conversation_id(&self) -> Option<Uuid> {
        self.widget.conversation_id()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.widget.transcript()
    }

    pub fn recorder(&self) -> &ConversationRecorder {
        &self.recorder
    }

    /// Open the widget, creating the conversation record on first open.
    ///
    /// On failure the widget returns to `Closed` and the error is returned.
    pub async fn open(&mut self) -> Result<Uuid, ChatError> {
        self.widget.apply(WidgetEvent::Open)?;

        if let Some(id) = self.widget.conversation_id() {
            self.widget.apply(WidgetEvent::ConversationReady(id))?;
            return Ok(id);
        }

        match self.recorder.open_conversation(&self.user_id).await {
            Ok(id) => {
                self.widget.apply(WidgetEvent::ConversationReady(id))?;
                Ok(id)
            }
            Err(e) => {
                self.widget.apply(WidgetEvent::OpenFailed)?;
                Err(e)
            }
        }
    }

    /// Submit a message.
    ///
    /// Returns `Ok(None)` for a blank message (nothing written). A turn that
    /// fails to persist still returns `Ok(Some(outcome))` and leaves the
    /// failure notice in the transcript.
    pub async fn submit(&mut self, text: &str) -> Result<Option<TurnOutcome>, ChatError> {
        self.widget.apply(WidgetEvent::Submit(text.to_string()))?;
        if self.widget.state() != WidgetState::Sending {
            debug!("Ignoring blank message");
            return Ok(None);
        }

        let notice = self.recorder.config().failure_notice.clone();
        let Some(conversation_id) = self.widget.conversation_id() else {
            self.widget.apply(WidgetEvent::TurnFailed(notice))?;
            return Err(ChatError::ConversationUnavailable(
                "no conversation is open".to_string(),
            ));
        };

        match self
            .recorder
            .send_turn(conversation_id, &self.user_id, text)
            .await
        {
            Ok(TurnOutcome::Completed { reply, log_id }) => {
                self.widget.apply(WidgetEvent::TurnComplete(reply.clone()))?;
                Ok(Some(TurnOutcome::Completed { reply, log_id }))
            }
            Ok(outcome) => {
                warn!(conversation_id = %conversation_id, ?outcome, "Turn not fully recorded");
                self.widget.apply(WidgetEvent::TurnFailed(notice))?;
                Ok(Some(outcome))
            }
            Err(e) => {
                self.widget.apply(WidgetEvent::TurnFailed(notice))?;
                Err(e)
            }
        }
    }

    pub fn close(&mut self) -> Result<(), ChatError> {
        self.widget.apply(WidgetEvent::Close)?;
        Ok(())
    }
}
