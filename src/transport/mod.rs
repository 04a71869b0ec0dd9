//! Backend clients: the interactive chat endpoint and the auto-save endpoint.
//!
//! Both are reached through traits so the session can be driven by mocks in
//! tests and by [`HttpChatTransport`] / [`HttpSaveTransport`] in production.

pub mod chat;
pub mod http;
pub mod save;

pub use chat::HttpChatTransport;
pub use save::HttpSaveTransport;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::types::{AgentId, Message, Role, SessionId};

/// One entry of `conversation_history` in the chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.text.clone(),
        }
    }
}

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub agent_id: String,
    pub message: String,
    pub conversation_id: String,
    pub conversation_history: Vec<HistoryEntry>,
}

impl ChatRequest {
    /// Build a request from the new message and the trailing context window.
    pub fn new(
        agent_id: &AgentId,
        session_id: &SessionId,
        message: impl Into<String>,
        context: &[Message],
    ) -> Self {
        Self {
            agent_id: agent_id.as_str().to_string(),
            message: message.into(),
            conversation_id: session_id.as_str().to_string(),
            conversation_history: context.iter().map(HistoryEntry::from).collect(),
        }
    }
}

/// Successful chat reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// Base64 or data-URL audio rendition of the reply.
    pub audio: Option<String>,
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio: None,
        }
    }
}

/// Interactive chat backend. Implementations fail fast: no retries.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;
}

/// Body of an auto-save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub conversation_id: String,
    pub agent_id: String,
    pub messages: Vec<Message>,
    pub auto_save: bool,
    pub timestamp: DateTime<Utc>,
}

impl SaveRequest {
    pub fn new(agent_id: &AgentId, session_id: &SessionId, messages: Vec<Message>) -> Self {
        Self {
            conversation_id: session_id.as_str().to_string(),
            agent_id: agent_id.as_str().to_string(),
            messages,
            auto_save: true,
            timestamp: Utc::now(),
        }
    }
}

/// Backend persistence endpoint used by auto-save.
#[async_trait]
pub trait SaveTransport: Send + Sync {
    async fn save(&self, request: &SaveRequest) -> Result<(), TransportError>;
}

/// Save transport for widgets without a persistence endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOnly;

#[async_trait]
impl SaveTransport for LocalOnly {
    async fn save(&self, _request: &SaveRequest) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageId;
    use serde_json::json;

    #[test]
    fn chat_request_wire_shape() {
        let agent = AgentId::parse("agent_123").unwrap();
        let session = SessionId::from_existing("conv_1");
        let context = vec![
            Message::new(MessageId(1), Role::User, "Hi"),
            Message::new(MessageId(2), Role::Assistant, "Hello!"),
        ];
        let request = ChatRequest::new(&agent, &session, "How are you?", &context);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "agent_id": "agent_123",
                "message": "How are you?",
                "conversation_id": "conv_1",
                "conversation_history": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello!"}
                ]
            })
        );
    }

    #[test]
    fn save_request_sets_auto_save_flag() {
        let agent = AgentId::parse("a").unwrap();
        let session = SessionId::from_existing("conv_2");
        let value = serde_json::to_value(SaveRequest::new(&agent, &session, vec![])).unwrap();
        assert_eq!(value["auto_save"], true);
        assert_eq!(value["conversation_id"], "conv_2");
        assert!(value["timestamp"].is_string());
    }
}
