//! Core data types: messages and conversation sessions.

pub mod message;
pub mod session;

pub use message::{Message, MessageId, Role};
pub use session::{AgentId, ConversationSession, SessionId, UiState};
