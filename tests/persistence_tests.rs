//! Durability across reloads and the auto-save schedule.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{Harness, MockChatTransport, MockSaveTransport};
use embedchat::config::WidgetConfig;
use embedchat::persistence::{DurableStorage, FileStorage, PersistenceBridge};
use embedchat::session::SessionEvent;
use embedchat::style::HostPage;
use embedchat::transport::ChatTransport;
use embedchat::types::Role;
use embedchat::widget::{mount, WidgetAttributes, WidgetDeps, WidgetRuntime};

fn settled(count: usize) -> impl FnMut(&embedchat::widget::WidgetSnapshot) -> bool {
    move |s| !s.pending && s.messages.len() == count
}

fn file_deps(dir: &TempDir, chat: Arc<dyn ChatTransport>) -> WidgetDeps {
    let config = WidgetConfig::builder()
        .storage_dir(dir.path().to_path_buf())
        .build();
    let persistence = PersistenceBridge::local_only(Arc::new(FileStorage::new(dir.path())));
    WidgetDeps::new(config, chat, persistence)
}

#[tokio::test(start_paused = true)]
async fn conversation_survives_reload() {
    let dir = TempDir::new().unwrap();
    let chat = Arc::new(MockChatTransport::new());
    chat.queue_reply("Hi there!");

    let first_page = HostPage::new();
    let attrs = WidgetAttributes::new("agent_123");
    let widget = mount(&first_page, &attrs, file_deps(&dir, chat.clone())).unwrap();
    let handle = WidgetRuntime::spawn(widget);
    handle.toggle();
    handle.submit("Hello");
    let before = handle.wait_for(settled(2)).await.unwrap();
    handle.remove();
    handle.join().await.unwrap();

    // Fresh page, same durable storage.
    let second_page = HostPage::new();
    let reloaded = mount(&second_page, &attrs, file_deps(&dir, chat.clone())).unwrap();

    assert_eq!(reloaded.session().session_id(), &before.session_id);
    assert_eq!(reloaded.session().messages().snapshot(), before.messages);
    assert_eq!(reloaded.controller().render().bubble_count(), 2);

    let handle = WidgetRuntime::spawn(reloaded);
    handle.toggle();
    handle.submit("Still there?");
    let after = handle.wait_for(settled(4)).await.unwrap();
    assert!(after.messages[2].id > before.messages[1].id);

    let requests = chat.requests();
    let history: Vec<_> = requests[1]
        .conversation_history
        .iter()
        .map(|h| (h.role, h.content.as_str()))
        .collect();
    assert_eq!(
        history,
        vec![(Role::User, "Hello"), (Role::Assistant, "Hi there!")]
    );
}

#[tokio::test(start_paused = true)]
async fn corrupt_snapshot_starts_fresh() {
    let harness = Harness::new(MockChatTransport::new());
    harness
        .storage
        .write("embedchat_conversation_current_agent_123", "conv_broken")
        .unwrap();
    harness
        .storage
        .write("embedchat_conversation_conv_broken", "{\"conversationId\":")
        .unwrap();

    let widget = harness.mount("agent_123");
    assert_eq!(widget.session().session_id().as_str(), "conv_broken");
    assert!(widget.session().messages().is_empty());
    assert_eq!(widget.controller().render().bubble_count(), 0);
}

/// Plant a parseable snapshot as the agent's current session.
fn plant_snapshot(
    harness: &Harness,
    agent_id: &str,
    session: &str,
    stored_agent: &str,
    ids: &[u64],
) {
    let conversation: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(n, id)| {
            serde_json::json!({
                "id": id,
                "role": if n % 2 == 0 { "user" } else { "assistant" },
                "text": format!("turn {n}"),
                "timestamp": "2024-05-01T12:00:00Z"
            })
        })
        .collect();
    let snapshot = serde_json::json!({
        "conversationId": session,
        "agentId": stored_agent,
        "conversation": conversation,
        "timestamp": "2024-05-01T12:00:00Z"
    });
    harness
        .storage
        .write(&format!("embedchat_conversation_current_{agent_id}"), session)
        .unwrap();
    harness
        .storage
        .write(
            &format!("embedchat_conversation_{session}"),
            &snapshot.to_string(),
        )
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn snapshot_with_maximal_id_starts_fresh() {
    let harness = Harness::new(MockChatTransport::new());
    plant_snapshot(&harness, "agent_123", "conv_edge", "agent_123", &[u64::MAX]);

    let mut widget = harness.mount("agent_123");
    assert!(widget.session().messages().is_empty());

    widget.dispatch(SessionEvent::Toggle);
    widget.dispatch(SessionEvent::Submit("Hello".into()));
    assert_eq!(widget.session().messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn snapshot_with_disordered_ids_starts_fresh() {
    let harness = Harness::new(MockChatTransport::new());
    plant_snapshot(&harness, "agent_123", "conv_shuffled", "agent_123", &[5, 2, 5]);

    let widget = harness.mount("agent_123");
    assert_eq!(widget.session().session_id().as_str(), "conv_shuffled");
    assert!(widget.session().messages().is_empty());
    assert_eq!(widget.controller().render().bubble_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn snapshot_of_another_agent_is_not_replayed() {
    let harness = Harness::new(MockChatTransport::new());
    plant_snapshot(&harness, "agent_123", "conv_other", "agent_456", &[1, 2]);

    let widget = harness.mount("agent_123");
    assert!(widget.session().messages().is_empty());
    assert_eq!(widget.controller().render().bubble_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn agents_with_similar_ids_keep_separate_conversations() {
    let dir = TempDir::new().unwrap();
    let chat = Arc::new(MockChatTransport::new());
    chat.queue_reply("noted");
    let page = HostPage::new();

    let widget = mount(
        &page,
        &WidgetAttributes::new("sales.bot"),
        file_deps(&dir, chat.clone()),
    )
    .unwrap();
    let dotted_session = widget.session().session_id().clone();
    let handle = WidgetRuntime::spawn(widget);
    handle.toggle();
    handle.submit("secret for sales.bot");
    handle.wait_for(settled(2)).await.unwrap();
    handle.remove();
    handle.join().await.unwrap();

    let dashed = mount(
        &page,
        &WidgetAttributes::new("sales-bot"),
        file_deps(&dir, chat.clone()),
    )
    .unwrap();
    assert_ne!(dashed.session().session_id(), &dotted_session);
    assert!(dashed.session().messages().is_empty());

    let dotted = mount(
        &page,
        &WidgetAttributes::new("sales.bot"),
        file_deps(&dir, chat),
    )
    .unwrap();
    assert_eq!(dotted.session().session_id(), &dotted_session);
    assert_eq!(dotted.session().messages().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn close_writes_local_snapshot() {
    let harness = Harness::new(MockChatTransport::new());
    let handle = WidgetRuntime::spawn(harness.mount("agent_123"));

    handle.toggle();
    handle.submit("Hello");
    let state = handle.wait_for(settled(2)).await.unwrap();
    handle.close();
    let closed = handle
        .wait_for(|s| s.last_persisted_at.is_some())
        .await
        .unwrap();

    let key = format!("embedchat_conversation_{}", state.session_id);
    let raw = harness.storage.read(&key).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["conversation"].as_array().unwrap().len(), 2);
    assert_eq!(closed.messages, state.messages);
}

#[tokio::test(start_paused = true)]
async fn failed_auto_save_retries_exactly_once() {
    let harness = Harness::with_saver(MockChatTransport::new(), MockSaveTransport::failing(2));
    let config = WidgetConfig::builder()
        .autosave_interval(Duration::from_secs(900))
        .retry_backoff(Duration::from_secs(300))
        .build();
    let handle = WidgetRuntime::spawn(harness.mount_with("agent_123", config));

    handle.toggle();
    handle.submit("Hello");
    handle.wait_for(settled(2)).await.unwrap();
    assert_eq!(harness.saver.calls(), 0);

    // Interval elapses: first attempt fails and arms one retry.
    tokio::time::sleep(Duration::from_secs(901)).await;
    assert_eq!(harness.saver.calls(), 1);

    // Retry fires after the backoff and fails too.
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(harness.saver.calls(), 2);

    // No further retry: nothing until the normal interval comes round again.
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(harness.saver.calls(), 2);

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(harness.saver.calls(), 3);
    let saved = harness.saver.saved();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].auto_save);
    assert_eq!(saved[0].messages.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn user_activity_pushes_back_auto_save() {
    let harness = Harness::new(MockChatTransport::new());
    let handle = WidgetRuntime::spawn(harness.mount("agent_123"));

    handle.toggle();
    handle.submit("Hello");
    handle.wait_for(settled(2)).await.unwrap();

    tokio::time::sleep(Duration::from_secs(800)).await;
    handle.typing("still typ");
    tokio::time::sleep(Duration::from_secs(200)).await;
    assert_eq!(harness.saver.calls(), 0);

    tokio::time::sleep(Duration::from_secs(701)).await;
    assert_eq!(harness.saver.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_conversation_is_never_auto_saved() {
    let harness = Harness::new(MockChatTransport::new());
    let handle = WidgetRuntime::spawn(harness.mount("agent_123"));
    handle.toggle();

    tokio::time::sleep(Duration::from_secs(3 * 900 + 1)).await;
    assert_eq!(harness.saver.calls(), 0);
    // Only the current-session pointer was written.
    assert_eq!(harness.storage.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unload_flushes_locally_and_to_backend() {
    let harness = Harness::new(MockChatTransport::new());
    let handle = WidgetRuntime::spawn(harness.mount("agent_123"));

    handle.toggle();
    handle.submit("Hello");
    let state = handle.wait_for(settled(2)).await.unwrap();
    handle.unload();
    handle.join().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let key = format!("embedchat_conversation_{}", state.session_id);
    assert!(harness.storage.read(&key).unwrap().is_some());
    let saved = harness.saver.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].conversation_id, state.session_id.as_str());
}
