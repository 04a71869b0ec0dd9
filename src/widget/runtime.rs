//! Cooperative event loop driving one widget instance.
//!
//! One task per widget. It waits on UI events, the single in-flight chat
//! request, an in-flight auto-save and the auto-save deadline, and handles
//! whichever is ready first. Nothing inside the loop runs in parallel.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::Widget;
use crate::error::TransportError;
use crate::persistence::AutoSaveSchedule;
use crate::render::Patch;
use crate::session::{Command, SessionEvent, SessionState};
use crate::transport::ChatReply;
use crate::types::{Message, SessionId, UiState};

type ReplyFuture = BoxFuture<'static, Result<ChatReply, TransportError>>;
type SaveFuture = BoxFuture<'static, Result<(), TransportError>>;

/// Events raised by the host page or the user.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Toggle,
    Close,
    Submit(String),
    Typing(String),
    /// Message list scrolled; pixels between the viewport and the end.
    Scrolled(f64),
    /// Host page is unloading: flush and stop.
    Unload,
    /// Element removed from the page: snapshot and stop.
    Remove,
}

/// Observable widget state, published after every handled event.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSnapshot {
    pub session_id: SessionId,
    pub state: SessionState,
    pub ui_state: UiState,
    pub pending: bool,
    pub messages: Vec<Message>,
    pub bubbles: usize,
    pub typing: bool,
    pub last_persisted_at: Option<DateTime<Utc>>,
}

impl WidgetSnapshot {
    fn capture(widget: &Widget) -> Self {
        let controller = widget.controller();
        let session = controller.session();
        Self {
            session_id: session.session_id().clone(),
            state: controller.state(),
            ui_state: session.ui_state(),
            pending: session.is_pending(),
            messages: session.messages().snapshot(),
            bubbles: controller.render().bubble_count(),
            typing: controller.render().typing_visible(),
            last_persisted_at: session.last_persisted_at(),
        }
    }
}

/// Handle to a running widget.
pub struct WidgetHandle {
    events_tx: mpsc::UnboundedSender<WidgetEvent>,
    snapshot_rx: watch::Receiver<WidgetSnapshot>,
    task: JoinHandle<Widget>,
}

impl WidgetHandle {
    /// Queue an event. Returns `false` once the widget has stopped.
    pub fn send(&self, event: WidgetEvent) -> bool {
        self.events_tx.send(event).is_ok()
    }

    pub fn toggle(&self) -> bool {
        self.send(WidgetEvent::Toggle)
    }

    pub fn close(&self) -> bool {
        self.send(WidgetEvent::Close)
    }

    pub fn submit(&self, text: impl Into<String>) -> bool {
        self.send(WidgetEvent::Submit(text.into()))
    }

    pub fn typing(&self, draft: impl Into<String>) -> bool {
        self.send(WidgetEvent::Typing(draft.into()))
    }

    pub fn scrolled(&self, offset_from_bottom: f64) -> bool {
        self.send(WidgetEvent::Scrolled(offset_from_bottom))
    }

    pub fn unload(&self) -> bool {
        self.send(WidgetEvent::Unload)
    }

    pub fn remove(&self) -> bool {
        self.send(WidgetEvent::Remove)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> WidgetSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// Returns `None` if the widget stopped first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&WidgetSnapshot) -> bool,
    ) -> Option<WidgetSnapshot> {
        let mut rx = self.snapshot_rx.clone();
        let matched = rx.wait_for(|s| predicate(s)).await.ok().map(|s| (*s).clone());
        matched
    }

    /// Wait for the loop to stop and take the widget back.
    pub async fn join(self) -> Option<Widget> {
        drop(self.events_tx);
        self.task.await.ok()
    }
}

/// Spawns the event loop for a mounted widget.
pub struct WidgetRuntime;

impl WidgetRuntime {
    pub fn spawn(widget: Widget) -> WidgetHandle {
        Self::start(widget, None)
    }

    /// Like [`WidgetRuntime::spawn`], also streaming render patches for a
    /// live view to apply.
    pub fn spawn_with_patches(widget: Widget) -> (WidgetHandle, mpsc::UnboundedReceiver<Patch>) {
        let (patches_tx, patches_rx) = mpsc::unbounded_channel();
        (Self::start(widget, Some(patches_tx)), patches_rx)
    }

    fn start(widget: Widget, patches_tx: Option<mpsc::UnboundedSender<Patch>>) -> WidgetHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(WidgetSnapshot::capture(&widget));
        let task = tokio::spawn(run_loop(widget, events_rx, snapshot_tx, patches_tx));
        WidgetHandle {
            events_tx,
            snapshot_rx,
            task,
        }
    }
}

async fn next_reply(in_flight: &mut Option<ReplyFuture>) -> Result<ChatReply, TransportError> {
    match in_flight {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn next_save(saving: &mut Option<SaveFuture>) -> Result<(), TransportError> {
    match saving {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

struct LoopState {
    in_flight: Option<ReplyFuture>,
    saving: Option<SaveFuture>,
    schedule: AutoSaveSchedule,
}

async fn run_loop(
    mut widget: Widget,
    mut events_rx: mpsc::UnboundedReceiver<WidgetEvent>,
    snapshot_tx: watch::Sender<WidgetSnapshot>,
    patches_tx: Option<mpsc::UnboundedSender<Patch>>,
) -> Widget {
    let config = widget.config().clone();
    let mut state = LoopState {
        in_flight: None,
        saving: None,
        schedule: AutoSaveSchedule::new(
            config.autosave_interval,
            config.retry_backoff,
            Instant::now(),
        ),
    };

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                match event {
                    Some(WidgetEvent::Unload) => {
                        widget.persistence().flush_on_unload(widget.session());
                        break;
                    }
                    Some(WidgetEvent::Remove) | None => {
                        widget.snapshot_local();
                        break;
                    }
                    Some(WidgetEvent::Scrolled(offset)) => {
                        widget.controller_mut().user_scrolled(offset);
                    }
                    Some(WidgetEvent::Toggle) => handle(&mut widget, &mut state, SessionEvent::Toggle),
                    Some(WidgetEvent::Close) => handle(&mut widget, &mut state, SessionEvent::Close),
                    Some(WidgetEvent::Submit(text)) => {
                        handle(&mut widget, &mut state, SessionEvent::Submit(text))
                    }
                    Some(WidgetEvent::Typing(draft)) => {
                        handle(&mut widget, &mut state, SessionEvent::Typing(draft))
                    }
                }
            }
            outcome = next_reply(&mut state.in_flight) => {
                state.in_flight = None;
                let commands = widget.controller_mut().complete(outcome);
                run_commands(&mut widget, &mut state, commands);
            }
            result = next_save(&mut state.saving) => {
                state.saving = None;
                let now = Instant::now();
                match result {
                    Ok(()) => state.schedule.on_save_succeeded(now),
                    Err(_) => {
                        if state.schedule.on_save_failed(now) {
                            tracing::info!(
                                session_id = %widget.session().session_id(),
                                retry_in_secs = config.retry_backoff.as_secs(),
                                "Auto-save retry scheduled"
                            );
                        }
                    }
                }
            }
            _ = sleep_until(state.schedule.deadline()), if state.saving.is_none() => {
                start_save(&mut widget, &mut state);
            }
        }

        if let Some(tx) = &patches_tx {
            for patch in widget.controller_mut().render_mut().drain_patches() {
                let _ = tx.send(patch);
            }
        } else {
            widget.controller_mut().render_mut().drain_patches();
        }
        snapshot_tx.send_replace(WidgetSnapshot::capture(&widget));
    }

    tracing::debug!(session_id = %widget.session().session_id(), "Widget stopped");
    snapshot_tx.send_replace(WidgetSnapshot::capture(&widget));
    widget
}

fn handle(widget: &mut Widget, state: &mut LoopState, event: SessionEvent) {
    let commands = widget.dispatch(event);
    run_commands(widget, state, commands);
}

fn run_commands(widget: &mut Widget, state: &mut LoopState, commands: Vec<Command>) {
    for command in commands {
        match command {
            Command::Send(request) => {
                if state.in_flight.is_some() {
                    tracing::warn!("Dropping send while a request is in flight");
                    continue;
                }
                let chat = widget.chat();
                state.in_flight = Some(Box::pin(async move { chat.send(&request).await }));
            }
            Command::PlayAudio(payload) => widget.play_audio(&payload),
            Command::Snapshot => {
                if state.saving.is_none() {
                    start_save(widget, state);
                } else {
                    widget.snapshot_local();
                }
            }
            Command::ResetAutoSave => state.schedule.reset(Instant::now()),
        }
    }
}

/// Local snapshot now, backend save in the background.
fn start_save(widget: &mut Widget, state: &mut LoopState) {
    widget.snapshot_local();
    match widget.persistence().prepare_save(widget.session()) {
        Some(request) => {
            let bridge = widget.persistence().clone();
            state.saving = Some(Box::pin(async move { bridge.save_remote(&request).await }));
        }
        None => state.schedule.skip(Instant::now()),
    }
}
