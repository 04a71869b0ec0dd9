//! Stored snapshot format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::ids_strictly_increasing;
use crate::types::{AgentId, ConversationSession, Message, SessionId};

/// `{conversationId, agentId, conversation, timestamp}` as written to durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub conversation_id: String,
    pub agent_id: String,
    pub conversation: Vec<Message>,
    pub timestamp: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Consistent point-in-time copy of the session's log.
    pub fn capture(session: &ConversationSession) -> Self {
        Self {
            conversation_id: session.session_id().as_str().to_string(),
            agent_id: session.agent_id().as_str().to_string(),
            conversation: session.messages().snapshot(),
            timestamp: Utc::now(),
        }
    }

    /// Check that this snapshot can be replayed into `agent_id`'s widget as
    /// `session_id`. Well-formed JSON with foreign or disordered content is
    /// rejected here like unparseable JSON.
    pub fn verify(&self, session_id: &SessionId, agent_id: &AgentId) -> Result<(), &'static str> {
        if self.conversation_id != session_id.as_str() {
            return Err("snapshot belongs to another session");
        }
        if self.agent_id != agent_id.as_str() {
            return Err("snapshot belongs to another agent");
        }
        if !ids_strictly_increasing(&self.conversation) {
            return Err("message ids are not strictly increasing");
        }
        Ok(())
    }
}
