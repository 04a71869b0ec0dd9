//! Convenience re-exports for common use.

pub use crate::config::{Locale, WidgetConfig};
pub use crate::error::{Result, StorageError, TransportError, WidgetError};
pub use crate::persistence::{DurableStorage, FileStorage, MemoryStorage, PersistenceBridge};
pub use crate::session::{SessionEvent, SessionState};
pub use crate::style::HostPage;
pub use crate::transport::{ChatReply, ChatRequest, ChatTransport, SaveTransport};
pub use crate::types::{AgentId, ConversationSession, Message, Role, SessionId, UiState};
pub use crate::widget::{
    mount, Widget, WidgetAttributes, WidgetDeps, WidgetEvent, WidgetHandle, WidgetRuntime,
    WidgetSnapshot,
};
