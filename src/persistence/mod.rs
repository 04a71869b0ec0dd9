//! Persistence bridge: durable local snapshots, backend auto-save, recovery.

pub mod schedule;
pub mod snapshot;
pub mod storage;

pub use schedule::AutoSaveSchedule;
pub use snapshot::SessionSnapshot;
pub use storage::{DurableStorage, FileStorage, MemoryStorage};

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::DEFAULT_STORAGE_PREFIX;
use crate::error::{StorageError, TransportError};
use crate::transport::{LocalOnly, SaveRequest, SaveTransport};
use crate::types::{AgentId, ConversationSession, Message, SessionId};

/// Makes a conversation durable across reloads and backend outages.
///
/// Local writes are synchronous and never fail loudly. Backend saves are
/// async and their failures are only logged; retry scheduling is the
/// caller's job via [`AutoSaveSchedule`].
#[derive(Clone)]
pub struct PersistenceBridge {
    storage: Arc<dyn DurableStorage>,
    saver: Arc<dyn SaveTransport>,
    prefix: String,
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl PersistenceBridge {
    pub fn new(storage: Arc<dyn DurableStorage>, saver: Arc<dyn SaveTransport>) -> Self {
        Self {
            storage,
            saver,
            prefix: DEFAULT_STORAGE_PREFIX.to_string(),
        }
    }

    /// Bridge that only snapshots locally, with no backend endpoint.
    pub fn local_only(storage: Arc<dyn DurableStorage>) -> Self {
        Self::new(storage, Arc::new(LocalOnly))
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn storage_key(&self, session_id: &SessionId) -> String {
        format!("{}{}", self.prefix, session_id.as_str())
    }

    /// Write the session to durable storage. Best effort: returns the write time
    /// on success and logs on failure.
    pub fn snapshot_local(&self, session: &ConversationSession) -> Option<DateTime<Utc>> {
        if session.messages().is_empty() {
            return None;
        }
        let snapshot = SessionSnapshot::capture(session);
        match self.write_snapshot(session.session_id(), &snapshot) {
            Ok(()) => {
                tracing::debug!(
                    session_id = %session.session_id(),
                    messages = snapshot.conversation.len(),
                    "Saved conversation locally"
                );
                Some(snapshot.timestamp)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session.session_id(),
                    error = %e,
                    "Local snapshot failed"
                );
                None
            }
        }
    }

    fn write_snapshot(
        &self,
        session_id: &SessionId,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(snapshot)?;
        self.storage.write(&self.storage_key(session_id), &serialized)
    }

    /// Read back a stored conversation.
    ///
    /// A missing, unreadable, corrupt or foreign snapshot yields an empty
    /// history: the widget then starts fresh.
    pub fn recover(&self, session_id: &SessionId, agent_id: &AgentId) -> Vec<Message> {
        let key = self.storage_key(session_id);
        let raw = match self.storage.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Snapshot unreadable");
                return Vec::new();
            }
        };
        let snapshot = match serde_json::from_str::<SessionSnapshot>(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Snapshot corrupt, starting fresh");
                return Vec::new();
            }
        };
        if let Err(reason) = snapshot.verify(session_id, agent_id) {
            tracing::warn!(
                session_id = %session_id,
                agent_id = %agent_id,
                reason,
                "Snapshot rejected, starting fresh"
            );
            return Vec::new();
        }
        tracing::info!(
            session_id = %session_id,
            messages = snapshot.conversation.len(),
            "Recovered conversation"
        );
        snapshot.conversation
    }

    /// Drop the stored snapshot for a session.
    pub fn forget(&self, session_id: &SessionId) {
        if let Err(e) = self.storage.remove(&self.storage_key(session_id)) {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to remove snapshot");
        }
    }

    fn current_key(&self, agent_id: &AgentId) -> String {
        format!("{}current_{}", self.prefix, agent_id.as_str())
    }

    /// Remember which session is live for an agent so a reload can resume it.
    pub fn remember_session(&self, agent_id: &AgentId, session_id: &SessionId) {
        if let Err(e) = self
            .storage
            .write(&self.current_key(agent_id), session_id.as_str())
        {
            tracing::warn!(agent_id = %agent_id, error = %e, "Failed to record current session");
        }
    }

    /// The session last remembered for an agent, if any.
    pub fn last_session(&self, agent_id: &AgentId) -> Option<SessionId> {
        match self.storage.read(&self.current_key(agent_id)) {
            Ok(Some(raw)) if !raw.trim().is_empty() => Some(SessionId::from_existing(raw.trim())),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(agent_id = %agent_id, error = %e, "Current session pointer unreadable");
                None
            }
        }
    }

    /// Stop resuming the agent's current session and drop its snapshot.
    pub fn start_over(&self, agent_id: &AgentId) {
        if let Some(session_id) = self.last_session(agent_id) {
            self.forget(&session_id);
        }
        if let Err(e) = self.storage.remove(&self.current_key(agent_id)) {
            tracing::warn!(agent_id = %agent_id, error = %e, "Failed to clear current session");
        }
    }

    /// Request body for a backend save, or `None` if there is nothing to save.
    pub fn prepare_save(&self, session: &ConversationSession) -> Option<SaveRequest> {
        if session.messages().is_empty() {
            return None;
        }
        Some(SaveRequest::new(
            session.agent_id(),
            session.session_id(),
            session.messages().snapshot(),
        ))
    }

    /// POST a prepared snapshot to the backend.
    pub async fn save_remote(&self, request: &SaveRequest) -> Result<(), TransportError> {
        let result = self.saver.save(request).await;
        match &result {
            Ok(()) => tracing::debug!(
                conversation_id = %request.conversation_id,
                messages = request.messages.len(),
                "Auto-saved conversation"
            ),
            Err(e) => tracing::warn!(
                conversation_id = %request.conversation_id,
                error = %e,
                "Auto-save failed"
            ),
        }
        result
    }

    /// Local snapshot followed by a backend save.
    pub async fn auto_save(&self, session: &ConversationSession) -> Result<(), TransportError> {
        self.snapshot_local(session);
        match self.prepare_save(session) {
            Some(request) => self.save_remote(&request).await,
            None => Ok(()),
        }
    }

    /// Page is going away: write locally and fire off a backend save without
    /// waiting for it.
    pub fn flush_on_unload(&self, session: &ConversationSession) {
        self.snapshot_local(session);
        let Some(request) = self.prepare_save(session) else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime available for unload flush");
            return;
        };
        let bridge = self.clone();
        handle.spawn(async move {
            let _ = bridge.save_remote(&request).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn agent() -> AgentId {
        AgentId::parse("agent_123").unwrap()
    }

    fn session_with(texts: &[(Role, &str)]) -> ConversationSession {
        let mut session = ConversationSession::new(AgentId::parse("agent_123").unwrap(), 10);
        for (role, text) in texts {
            session.messages_mut().append(*role, *text);
        }
        session
    }

    #[test]
    fn snapshot_then_recover_reproduces_messages() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::local_only(storage.clone());
        let session = session_with(&[(Role::User, "Hello"), (Role::Assistant, "Hi there!")]);

        assert!(bridge.snapshot_local(&session).is_some());
        let recovered = bridge.recover(session.session_id(), session.agent_id());
        assert_eq!(recovered, session.messages().snapshot());
    }

    #[test]
    fn stored_value_uses_camel_case_layout() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::local_only(storage.clone());
        let session = session_with(&[(Role::User, "Hello")]);
        bridge.snapshot_local(&session);

        let key = format!("embedchat_conversation_{}", session.session_id());
        let raw = storage.read(&key).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["conversationId"], session.session_id().as_str());
        assert_eq!(value["agentId"], "agent_123");
        assert_eq!(value["conversation"][0]["text"], "Hello");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn corrupt_snapshot_is_treated_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::local_only(storage.clone());
        let id = SessionId::from_existing("conv_x");
        storage.write(&bridge.storage_key(&id), "{not json").unwrap();
        assert!(bridge.recover(&id, &agent()).is_empty());
    }

    #[test]
    fn empty_session_is_not_written() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::local_only(storage.clone());
        let session = session_with(&[]);
        assert!(bridge.snapshot_local(&session).is_none());
        assert!(storage.is_empty());
        assert!(bridge.prepare_save(&session).is_none());
    }

    #[test]
    fn current_session_pointer_round_trip() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::local_only(storage);
        let agent = AgentId::parse("agent_123").unwrap();
        assert!(bridge.last_session(&agent).is_none());

        let session = SessionId::from_existing("conv_abc");
        bridge.remember_session(&agent, &session);
        assert_eq!(bridge.last_session(&agent), Some(session));

        bridge.start_over(&agent);
        assert!(bridge.last_session(&agent).is_none());
    }

    #[test]
    fn forget_removes_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::local_only(storage.clone());
        let session = session_with(&[(Role::User, "x")]);
        bridge.snapshot_local(&session);
        bridge.forget(session.session_id());
        assert!(bridge
            .recover(session.session_id(), session.agent_id())
            .is_empty());
    }

    #[test]
    fn snapshot_of_another_agent_is_not_replayed() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::local_only(storage.clone());
        let session = session_with(&[(Role::User, "for agent_123 only")]);
        bridge.snapshot_local(&session);

        let other = AgentId::parse("agent_456").unwrap();
        assert!(bridge.recover(session.session_id(), &other).is_empty());
        assert_eq!(bridge.recover(session.session_id(), &agent()).len(), 1);
    }

    #[test]
    fn snapshot_with_disordered_ids_is_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::local_only(storage.clone());
        let id = SessionId::from_existing("conv_ids");
        let raw = serde_json::json!({
            "conversationId": "conv_ids",
            "agentId": "agent_123",
            "conversation": [
                {"id": 5, "role": "user", "text": "a", "timestamp": "2024-01-01T00:00:00Z"},
                {"id": 2, "role": "assistant", "text": "b", "timestamp": "2024-01-01T00:00:01Z"},
                {"id": 5, "role": "user", "text": "c", "timestamp": "2024-01-01T00:00:02Z"}
            ],
            "timestamp": "2024-01-01T00:00:02Z"
        });
        storage
            .write(&bridge.storage_key(&id), &raw.to_string())
            .unwrap();
        assert!(bridge.recover(&id, &agent()).is_empty());
    }
}
