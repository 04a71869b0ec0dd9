//! Conversation session state owned by one widget instance.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WidgetError;
use crate::store::MessageStore;

/// Opaque, client-generated session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(format!("conv_{}", Uuid::new_v4().simple()))
    }

    /// Wrap an existing identifier, e.g. one handed back by the host page.
    pub fn from_existing(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Agent identifier supplied by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Validate and wrap an agent id. Blank ids are rejected.
    pub fn parse(raw: &str) -> Result<Self, WidgetError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WidgetError::MissingAgentId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visibility of the widget panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UiState {
    #[default]
    Closed,
    Open,
}

/// State of one conversation. `session_id` and `agent_id` are fixed at
/// construction; a new conversation needs a new session.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    session_id: SessionId,
    agent_id: AgentId,
    messages: MessageStore,
    last_persisted_at: Option<DateTime<Utc>>,
    ui_state: UiState,
    pending: bool,
}

impl ConversationSession {
    pub fn new(agent_id: AgentId, context_window: usize) -> Self {
        Self::with_session_id(SessionId::generate(), agent_id, context_window)
    }

    pub fn with_session_id(session_id: SessionId, agent_id: AgentId, context_window: usize) -> Self {
        Self {
            session_id,
            agent_id,
            messages: MessageStore::new(context_window),
            last_persisted_at: None,
            ui_state: UiState::Closed,
            pending: false,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub(crate) fn messages_mut(&mut self) -> &mut MessageStore {
        &mut self.messages
    }

    pub fn last_persisted_at(&self) -> Option<DateTime<Utc>> {
        self.last_persisted_at
    }

    pub(crate) fn mark_persisted(&mut self, at: DateTime<Utc>) {
        self.last_persisted_at = Some(at);
    }

    pub fn ui_state(&self) -> UiState {
        self.ui_state
    }

    pub(crate) fn set_ui_state(&mut self, state: UiState) {
        self.ui_state = state;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }
}
