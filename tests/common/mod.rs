//! Shared test helpers: mock transports, a recording audio player and a
//! widget factory.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use embedchat::audio::{AudioClip, AudioPlayer, PlaybackError};
use embedchat::config::WidgetConfig;
use embedchat::error::TransportError;
use embedchat::persistence::{DurableStorage, MemoryStorage, PersistenceBridge};
use embedchat::style::HostPage;
use embedchat::transport::{ChatReply, ChatRequest, ChatTransport, SaveRequest, SaveTransport};
use embedchat::widget::{mount, Widget, WidgetAttributes, WidgetDeps};

/// A chat backend that returns canned outcomes in order.
#[derive(Default)]
pub struct MockChatTransport {
    outcomes: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockChatTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_reply(&self, text: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(ChatReply::text(text)));
    }

    pub fn queue_reply_with_audio(&self, text: &str, audio: &str) {
        self.outcomes.lock().unwrap().push_back(Ok(ChatReply {
            text: text.to_string(),
            audio: Some(audio.to_string()),
        }));
    }

    pub fn queue_error(&self, error: TransportError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for MockChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatReply::text("Mock response")))
    }
}

/// A save backend that fails the first `failures` calls.
#[derive(Default)]
pub struct MockSaveTransport {
    failures: AtomicUsize,
    saved: Mutex<Vec<SaveRequest>>,
    calls: AtomicUsize,
}

impl MockSaveTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<SaveRequest> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl SaveTransport for MockSaveTransport {
    async fn save(&self, request: &SaveRequest) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(TransportError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.saved.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// Player that records clips and can be told to refuse autoplay.
#[derive(Default)]
pub struct RecordingPlayer {
    pub played: Mutex<Vec<AudioClip>>,
    pub block: bool,
}

impl AudioPlayer for RecordingPlayer {
    fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError> {
        if self.block {
            return Err(PlaybackError::AutoplayBlocked);
        }
        self.played.lock().unwrap().push(clip.clone());
        Ok(())
    }
}

/// Everything a widget test usually wants to inspect afterwards.
pub struct Harness {
    pub page: HostPage,
    pub chat: Arc<MockChatTransport>,
    pub saver: Arc<MockSaveTransport>,
    pub storage: Arc<MemoryStorage>,
    pub player: Arc<RecordingPlayer>,
}

impl Harness {
    pub fn new(chat: MockChatTransport) -> Self {
        Self::with_saver(chat, MockSaveTransport::new())
    }

    pub fn with_saver(chat: MockChatTransport, saver: MockSaveTransport) -> Self {
        Self {
            page: HostPage::new(),
            chat: Arc::new(chat),
            saver: Arc::new(saver),
            storage: Arc::new(MemoryStorage::new()),
            player: Arc::new(RecordingPlayer::default()),
        }
    }

    pub fn persistence(&self) -> PersistenceBridge {
        let storage: Arc<dyn DurableStorage> = self.storage.clone();
        PersistenceBridge::new(storage, self.saver.clone())
    }

    pub fn deps(&self, config: WidgetConfig) -> WidgetDeps {
        WidgetDeps::new(config, self.chat.clone(), self.persistence())
            .with_player(self.player.clone())
    }

    pub fn mount(&self, agent_id: &str) -> Widget {
        self.mount_with(agent_id, WidgetConfig::default())
    }

    pub fn mount_with(&self, agent_id: &str, config: WidgetConfig) -> Widget {
        mount(&self.page, &WidgetAttributes::new(agent_id), self.deps(config)).unwrap()
    }
}
