//! Applies state-machine effects to the session, store and render engine.

use super::machine::{transition, Effect, SessionEvent, SessionState};
use crate::config::Locale;
use crate::render::RenderEngine;
use crate::transport::{ChatReply, ChatRequest};
use crate::types::{ConversationSession, Message, Role, UiState};

/// Work the controller cannot do itself; carried out by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Issue a chat request. At most one is outstanding at a time.
    Send(ChatRequest),
    PlayAudio(String),
    /// Snapshot the conversation (close action).
    Snapshot,
    /// User activity: push back the auto-save deadline.
    ResetAutoSave,
}

/// Owns one conversation and its rendered view.
///
/// Everything here is synchronous. Network calls, timers and audio are
/// returned as [`Command`]s.
#[derive(Debug)]
pub struct SessionController {
    session: ConversationSession,
    state: SessionState,
    render: RenderEngine,
    locale: Locale,
    draft: String,
    input_focused: bool,
}

impl SessionController {
    pub fn new(session: ConversationSession, locale: Locale) -> Self {
        Self {
            session,
            state: SessionState::Closed,
            render: RenderEngine::new().with_greeting(locale.greeting()),
            locale,
            draft: String::new(),
            input_focused: false,
        }
    }

    /// Replay recovered messages into the store and the view.
    ///
    /// Only applies to a fresh session; returns how many were restored.
    pub fn restore(&mut self, messages: Vec<Message>) -> usize {
        let restored = self.session.messages_mut().restore(messages);
        for message in self.session.messages().iter() {
            self.render.append_message(message);
        }
        restored
    }

    /// Feed one event through the dispatch table.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Command> {
        let context = self.session.messages().context_window().to_vec();
        let Some(step) = transition(self.state, self.session.is_pending(), event) else {
            return Vec::new();
        };

        let from = self.state;
        self.state = step.next;
        let mut commands = Vec::new();
        for effect in step.effects {
            self.apply(effect, &context, &mut commands);
        }
        if from != self.state {
            tracing::debug!(
                session_id = %self.session.session_id(),
                from = %from,
                to = %self.state,
                "Session transition"
            );
        }

        if self.state == SessionState::Error {
            commands.extend(self.handle(SessionEvent::Recovered));
        }
        commands
    }

    fn apply(&mut self, effect: Effect, context: &[Message], commands: &mut Vec<Command>) {
        match effect {
            Effect::Show => self.session.set_ui_state(UiState::Open),
            Effect::Hide => {
                self.session.set_ui_state(UiState::Closed);
                self.input_focused = false;
            }
            Effect::FocusInput => self.input_focused = true,
            Effect::UpdateDraft(draft) => self.draft = draft,
            Effect::AppendUser(text) => self.append(Role::User, text),
            Effect::ClearInput => self.draft.clear(),
            Effect::SetPending(pending) => self.session.set_pending(pending),
            Effect::ShowTyping => self.render.show_typing(),
            Effect::HideTyping => self.render.hide_typing(),
            Effect::ResetAutoSave => commands.push(Command::ResetAutoSave),
            Effect::Dispatch(text) => commands.push(Command::Send(ChatRequest::new(
                self.session.agent_id(),
                self.session.session_id(),
                text,
                context,
            ))),
            Effect::AppendAssistant(text) => self.append(Role::Assistant, text),
            Effect::AppendFallback => {
                self.append(Role::Assistant, self.locale.fallback_message().to_string())
            }
            Effect::PlayAudio(audio) => commands.push(Command::PlayAudio(audio)),
            Effect::Snapshot => commands.push(Command::Snapshot),
        }
    }

    fn append(&mut self, role: Role, text: String) {
        let message = self.session.messages_mut().append(role, text);
        self.render.append_message(message);
    }

    /// Shorthand for feeding a transport outcome.
    pub fn complete(&mut self, outcome: Result<ChatReply, crate::error::TransportError>) -> Vec<Command> {
        match outcome {
            Ok(reply) => self.handle(SessionEvent::ReplyReceived(reply)),
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session.session_id(),
                    kind = %e.kind(),
                    error = %e,
                    "Chat request failed, showing fallback"
                );
                self.handle(SessionEvent::ReplyFailed(e.kind()))
            }
        }
    }

    pub fn user_scrolled(&mut self, offset_from_bottom: f64) {
        self.render.user_scrolled(offset_from_bottom);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut ConversationSession {
        &mut self.session
    }

    pub fn render(&self) -> &RenderEngine {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut RenderEngine {
        &mut self.render
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }
}
