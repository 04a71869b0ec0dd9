//! The embeddable widget element: attributes, mounting, rendering.

pub mod delivery;
pub mod runtime;

pub use runtime::{WidgetEvent, WidgetHandle, WidgetRuntime, WidgetSnapshot};

use std::sync::Arc;

use crate::audio::{AudioPlaybackController, AudioPlayer, NullPlayer};
use crate::config::WidgetConfig;
use crate::error::WidgetError;
use crate::persistence::{FileStorage, PersistenceBridge};
use crate::render::chrome::{focus_order, header_node, input_node, toggle_node, ControlIds};
use crate::render::{Element, Node};
use crate::session::{Command, SessionController, SessionEvent};
use crate::style::{HostPage, SessionClaim, ShadowScope, ELEMENT_TAG};
use crate::transport::{ChatTransport, HttpChatTransport, HttpSaveTransport, LocalOnly};
use crate::types::{AgentId, ConversationSession, SessionId, UiState};

const DEFAULT_AGENT_NAME: &str = "Assistant";

/// Attributes read from the host page's custom tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetAttributes {
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
}

impl WidgetAttributes {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            agent_name: None,
        }
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    /// Read `agent-id` / `agent-name` from raw attribute pairs. Names are
    /// matched case-insensitively; anything else is ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut attrs = Self::default();
        for (name, value) in pairs {
            match name.trim().to_ascii_lowercase().as_str() {
                "agent-id" => attrs.agent_id = Some(value.to_string()),
                "agent-name" => attrs.agent_name = Some(value.to_string()),
                _ => {}
            }
        }
        attrs
    }

    pub fn display_name(&self) -> &str {
        self.agent_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_AGENT_NAME)
    }

    /// The bare custom tag, as a host page would write it.
    pub fn element_node(&self) -> Node {
        let mut el = Element::new(ELEMENT_TAG);
        if let Some(id) = &self.agent_id {
            el = el.attr("agent-id", id.as_str());
        }
        if let Some(name) = &self.agent_name {
            el = el.attr("agent-name", name.as_str());
        }
        el.into()
    }
}

/// Collaborators a widget needs. Swappable for tests.
pub struct WidgetDeps {
    pub config: WidgetConfig,
    pub chat: Arc<dyn ChatTransport>,
    pub persistence: PersistenceBridge,
    pub player: Arc<dyn AudioPlayer>,
    /// Resume this session instead of the remembered or a fresh one.
    pub session_id: Option<SessionId>,
}

impl WidgetDeps {
    pub fn new(
        config: WidgetConfig,
        chat: Arc<dyn ChatTransport>,
        persistence: PersistenceBridge,
    ) -> Self {
        Self {
            config,
            chat,
            persistence,
            player: Arc::new(NullPlayer),
            session_id: None,
        }
    }

    /// HTTP transports and file-backed storage as described by the config.
    pub fn from_config(config: WidgetConfig) -> Self {
        let chat = Arc::new(HttpChatTransport::from_config(&config));
        let storage = Arc::new(FileStorage::new(config.resolved_storage_dir()));
        let persistence = match HttpSaveTransport::from_config(&config) {
            Some(saver) => PersistenceBridge::new(storage, Arc::new(saver)),
            None => PersistenceBridge::new(storage, Arc::new(LocalOnly)),
        }
        .with_prefix(config.storage_prefix.clone());
        Self::new(config, chat, persistence)
    }

    pub fn with_player(mut self, player: Arc<dyn AudioPlayer>) -> Self {
        self.player = player;
        self
    }

    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// A mounted widget instance.
pub struct Widget {
    controller: SessionController,
    agent_name: String,
    chat: Arc<dyn ChatTransport>,
    persistence: PersistenceBridge,
    audio: AudioPlaybackController,
    config: WidgetConfig,
    _claim: SessionClaim,
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("session_id", self.session().session_id())
            .field("agent_id", self.session().agent_id())
            .field("state", &self.controller.state())
            .finish_non_exhaustive()
    }
}

/// Mount a widget on `page`.
///
/// A missing or blank `agent-id` fails this instance only: it is logged and
/// returned as [`WidgetError::MissingAgentId`], nothing is rendered, and the
/// page's registration state is left untouched.
pub fn mount(
    page: &HostPage,
    attrs: &WidgetAttributes,
    deps: WidgetDeps,
) -> Result<Widget, WidgetError> {
    let Some(Ok(agent_id)) = attrs.agent_id.as_deref().map(AgentId::parse) else {
        tracing::error!("embedchat widget requires a non-empty agent-id attribute; not rendering");
        return Err(WidgetError::MissingAgentId);
    };
    deps.config.validate()?;

    page.define_element_once(ELEMENT_TAG);
    ShadowScope::install(page);

    let WidgetDeps {
        config,
        chat,
        persistence,
        player,
        session_id,
    } = deps;

    // A session id is owned by at most one live widget on the page; a second
    // instance for the same agent gets a fresh one and leaves the pointer alone.
    let resumable = session_id.or_else(|| persistence.last_session(&agent_id));
    let contested = resumable.is_some();
    let resumed = resumable.and_then(|id| match page.claim_session(&id) {
        Some(claim) => Some((id, claim)),
        None => {
            tracing::info!(session_id = %id, "Session owned by another widget; starting a new one");
            None
        }
    });
    let (session_id, claim, recovered) = match resumed {
        Some((id, claim)) => {
            let recovered = persistence.recover(&id, &agent_id);
            persistence.remember_session(&agent_id, &id);
            (id, claim, recovered)
        }
        None => {
            let (id, claim) = fresh_session(page);
            if !contested {
                persistence.remember_session(&agent_id, &id);
            }
            (id, claim, Vec::new())
        }
    };

    let session = ConversationSession::with_session_id(session_id, agent_id, config.context_window);
    let mut controller = SessionController::new(session, config.locale);
    let restored = controller.restore(recovered);

    tracing::info!(
        session_id = %controller.session().session_id(),
        agent_id = %controller.session().agent_id(),
        restored,
        "Mounted chat widget"
    );

    Ok(Widget {
        controller,
        agent_name: attrs.display_name().to_string(),
        chat,
        persistence,
        audio: AudioPlaybackController::new(player),
        config,
        _claim: claim,
    })
}

fn fresh_session(page: &HostPage) -> (SessionId, SessionClaim) {
    loop {
        let id = SessionId::generate();
        if let Some(claim) = page.claim_session(&id) {
            return (id, claim);
        }
    }
}

impl Widget {
    pub fn session(&self) -> &ConversationSession {
        self.controller.session()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub(crate) fn chat(&self) -> Arc<dyn ChatTransport> {
        self.chat.clone()
    }

    pub(crate) fn persistence(&self) -> &PersistenceBridge {
        &self.persistence
    }

    pub(crate) fn controller_mut(&mut self) -> &mut SessionController {
        &mut self.controller
    }

    /// Route a UI event through the session; I/O is returned as commands.
    pub fn dispatch(&mut self, event: SessionEvent) -> Vec<Command> {
        self.controller.handle(event)
    }

    pub(crate) fn play_audio(&self, payload: &str) {
        self.audio.play(payload);
    }

    /// Local snapshot; records the persisted time on success.
    pub fn snapshot_local(&mut self) {
        if let Some(at) = self.persistence.snapshot_local(self.controller.session()) {
            self.controller.session_mut().mark_persisted(at);
        }
    }

    /// Full widget tree inside its style scope.
    pub fn render(&self) -> Node {
        let locale = self.controller.locale();
        let session = self.controller.session();
        let open = session.ui_state() == UiState::Open;
        let ids = self.control_ids();

        let mut panel = Element::new("section")
            .class("ec-panel")
            .attr("role", "dialog")
            .attr("aria-label", self.agent_name.as_str());
        if !open {
            panel = panel.attr("hidden", "hidden");
        }
        let panel = panel
            .child(header_node(&ids, &self.agent_name, locale))
            .child(self.controller.render().messages_container())
            .child(input_node(&ids, locale, self.controller.draft(), session.is_pending()));

        let scope = ShadowScope::wrap(
            [toggle_node(&ids, locale, open), panel.into()],
            &self.controller.state().to_string(),
        );
        Element::new(ELEMENT_TAG)
            .attr("agent-id", session.agent_id().as_str())
            .attr("data-session-id", session.session_id().as_str())
            .child(scope)
            .into()
    }

    pub fn to_html(&self) -> String {
        self.render().to_html()
    }

    pub fn control_ids(&self) -> ControlIds {
        ControlIds::for_session(self.session().session_id())
    }

    /// Ids of the interactive controls in keyboard focus order.
    pub fn focus_order(&self) -> Vec<String> {
        focus_order(&self.render())
    }
}
