//! Session state machine as a single dispatch table.
//!
//! [`transition`] is pure: it maps `(state, pending, event)` to the next
//! state and an ordered list of effects. Applying the effects is the
//! controller's job.

use strum::Display;

use crate::error::FailureKind;
use crate::transport::ChatReply;

/// Lifecycle state of a widget session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    #[default]
    Closed,
    Open,
    Sending,
    Error,
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Toggle,
    Close,
    Submit(String),
    /// The user edited the input; carries the current draft.
    Typing(String),
    ReplyReceived(ChatReply),
    ReplyFailed(FailureKind),
    /// Leave `Error` once the fallback has been shown.
    Recovered,
}

/// Side effect requested by a transition, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Show,
    Hide,
    FocusInput,
    UpdateDraft(String),
    AppendUser(String),
    ClearInput,
    SetPending(bool),
    ShowTyping,
    HideTyping,
    ResetAutoSave,
    Dispatch(String),
    AppendAssistant(String),
    AppendFallback,
    PlayAudio(String),
    Snapshot,
}

/// Result of a handled event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: SessionState, effects: Vec<Effect>) -> Option<Self> {
        Some(Self { next, effects })
    }
}

/// Dispatch table. `None` means the event is ignored in this state.
pub fn transition(state: SessionState, pending: bool, event: SessionEvent) -> Option<Transition> {
    use Effect::*;
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        (S::Closed, E::Toggle) if pending => {
            Transition::to(S::Sending, vec![Show, FocusInput, ShowTyping])
        }
        (S::Closed, E::Toggle) => Transition::to(S::Open, vec![Show, FocusInput]),
        (S::Open | S::Sending | S::Error, E::Toggle) => {
            Transition::to(S::Closed, vec![Hide, Snapshot])
        }
        (S::Closed, E::Close) => None,
        (_, E::Close) => Transition::to(S::Closed, vec![Hide, Snapshot]),

        (S::Open, E::Submit(text)) if !pending => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Transition::to(
                S::Sending,
                vec![
                    AppendUser(text.to_string()),
                    ClearInput,
                    SetPending(true),
                    ShowTyping,
                    ResetAutoSave,
                    Dispatch(text.to_string()),
                ],
            )
        }
        (_, E::Submit(_)) => None,

        (S::Open | S::Sending | S::Error, E::Typing(draft)) => {
            Transition::to(state, vec![UpdateDraft(draft), ResetAutoSave])
        }
        (S::Closed, E::Typing(_)) => None,

        (S::Closed, E::ReplyReceived(reply)) if pending => Transition::to(
            S::Closed,
            vec![AppendAssistant(reply.text), HideTyping, SetPending(false)],
        ),
        (_, E::ReplyReceived(reply)) if pending => {
            let mut effects = vec![AppendAssistant(reply.text), HideTyping, SetPending(false)];
            if let Some(audio) = reply.audio {
                effects.push(PlayAudio(audio));
            }
            Transition::to(S::Open, effects)
        }
        (S::Closed, E::ReplyFailed(_)) if pending => Transition::to(
            S::Closed,
            vec![AppendFallback, HideTyping, SetPending(false)],
        ),
        (_, E::ReplyFailed(_)) if pending => Transition::to(
            S::Error,
            vec![AppendFallback, HideTyping, SetPending(false)],
        ),
        (_, E::ReplyReceived(_) | E::ReplyFailed(_)) => None,

        (S::Error, E::Recovered) => Transition::to(S::Open, vec![]),
        (_, E::Recovered) => None,
    }
}
