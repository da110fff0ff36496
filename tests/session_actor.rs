mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::time::timeout;
use warung::common::types::CHAT_COLLECTION;
use warung::common::{ChatMessage, FeedCommand, FeedEvent};
use warung::feed::{ChatSession, SessionHandle};
use warung::storage::{DocumentStore, SqliteStore};
use warung::ui::ChatApp;

use common::{ScriptedStore, seed_messages};

const WAIT: Duration = Duration::from_secs(2);

async fn recv(events: &mut mpsc::Receiver<FeedEvent>) -> FeedEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("event in time")
        .expect("session still running")
}

#[tokio::test]
async fn actor_serves_pages_and_live_messages() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    seed_messages(store.as_ref(), 150).await;
    let session = ChatSession::mount(store.clone(), 100).await.unwrap();

    let (event_tx, mut events) = mpsc::channel(16);
    let handle = SessionHandle::spawn(session, event_tx);

    match recv(&mut events).await {
        FeedEvent::Mounted { messages, has_more } => {
            assert_eq!(messages.len(), 100);
            assert!(has_more);
        }
        other => panic!("unexpected {other:?}"),
    }

    handle
        .send(FeedCommand::SendMessage {
            sender: "Ayah".to_string(),
            body: "meja 2 minta sambal".to_string(),
        })
        .await
        .unwrap();
    match recv(&mut events).await {
        FeedEvent::MessageArrived(message) => assert_eq!(message.body, "meja 2 minta sambal"),
        other => panic!("unexpected {other:?}"),
    }

    handle.send(FeedCommand::LoadMore).await.unwrap();
    match recv(&mut events).await {
        FeedEvent::PageLoaded { messages, has_more } => {
            assert_eq!(messages.len(), 50);
            assert!(!has_more);
        }
        other => panic!("unexpected {other:?}"),
    }

    handle.join().await;
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn actor_reports_failures_without_stopping() {
    let store = ScriptedStore::new();
    seed_messages(store.as_ref(), 120).await;
    let session = ChatSession::mount(store.clone(), 100).await.unwrap();

    let (event_tx, mut events) = mpsc::channel(16);
    let handle = SessionHandle::spawn(session, event_tx);
    recv(&mut events).await;

    store.fail_queries(true);
    handle.send(FeedCommand::LoadMore).await.unwrap();
    assert!(matches!(recv(&mut events).await, FeedEvent::LoadFailed(_)));

    store.fail_queries(false);
    handle.send(FeedCommand::LoadMore).await.unwrap();
    assert!(matches!(
        recv(&mut events).await,
        FeedEvent::PageLoaded { has_more: false, .. }
    ));

    handle.join().await;
}

#[tokio::test]
async fn load_more_queued_before_teardown_is_served() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    seed_messages(store.as_ref(), 150).await;
    let session = ChatSession::mount(store.clone(), 100).await.unwrap();

    let (event_tx, mut events) = mpsc::channel(16);
    let handle = SessionHandle::spawn(session, event_tx);
    handle.send(FeedCommand::LoadMore).await.unwrap();
    handle.join().await;

    assert!(matches!(recv(&mut events).await, FeedEvent::Mounted { .. }));
    match recv(&mut events).await {
        FeedEvent::PageLoaded { messages, has_more } => {
            assert_eq!(messages.len(), 50);
            assert!(!has_more);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn teardown_drops_in_flight_page() {
    let store = ScriptedStore::new();
    seed_messages(store.as_ref(), 150).await;
    let session = ChatSession::mount(store.clone(), 100).await.unwrap();

    let (event_tx, mut events) = mpsc::channel(16);
    let handle = SessionHandle::spawn(session, event_tx);
    recv(&mut events).await;

    store.delay_queries(Duration::from_millis(300));
    handle.send(FeedCommand::LoadMore).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.join().await;

    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn actor_reports_dropped_live_view() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let session = ChatSession::mount(store.clone(), 100).await.unwrap();

    let (event_tx, mut events) = mpsc::channel(16);
    let handle = SessionHandle::spawn(session, event_tx);
    recv(&mut events).await;

    store.disconnect_watchers().unwrap();
    assert_eq!(recv(&mut events).await, FeedEvent::LiveStopped);

    // paging and sending still work
    handle
        .send(FeedCommand::SendMessage {
            sender: "Bunda".to_string(),
            body: "masih bisa kirim".to_string(),
        })
        .await
        .unwrap();
    handle.join().await;
    assert_eq!(store.list(CHAT_COLLECTION).await.unwrap().len(), 1);
}

#[tokio::test]
async fn chat_app_renders_feed_and_sends_typed_lines() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let fields = ChatMessage::outgoing_fields("Bunda", "selamat pagi");
    store.write(CHAT_COLLECTION, fields).await.unwrap();

    let session = ChatSession::mount(store.clone(), 100).await.unwrap();
    let (event_tx, event_rx) = mpsc::channel(16);
    let handle = SessionHandle::spawn(session, event_tx);

    let mut output = Vec::new();
    let input = BufReader::new("/name Ayah\nnasi tinggal 3\n/more\n".as_bytes());
    let app = ChatApp::new(handle, event_rx, "Bunda", false, &mut output);
    app.run(input).await.unwrap();

    let rendered = String::from_utf8(output).unwrap();
    let messages = store.list(CHAT_COLLECTION).await.unwrap();
    assert_eq!(messages.len(), 2);
    let sent = ChatMessage::from_document(&messages[1]);
    assert_eq!(sent.sender, "Ayah");
    assert_eq!(sent.body, "nasi tinggal 3");
    assert!(!rendered.contains("/more"));
}

#[tokio::test]
async fn chat_app_reports_how_many_messages_are_shown() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let session = ChatSession::new(store, 2);
    let (event_tx, event_rx) = mpsc::channel(16);
    let handle = SessionHandle::spawn(session, event_tx);

    let message = |id: &str| ChatMessage {
        id: id.to_string(),
        sender: "Bunda".to_string(),
        body: format!("pesan {id}"),
        created_at: None,
    };
    let mut output = Vec::new();
    let mut app = ChatApp::new(handle, event_rx, "Bunda", false, &mut output);
    app.handle_event(FeedEvent::Mounted {
        messages: vec![message("b"), message("a")],
        has_more: true,
    })
    .unwrap();
    app.handle_event(FeedEvent::LiveStopped).unwrap();
    assert_eq!(app.state().visible, 2);
    assert!(app.state().has_more);
    drop(app);

    let rendered = String::from_utf8(output).unwrap();
    assert!(rendered.contains("(2 messages shown; type /more for older messages)"));
    assert!(rendered.contains("! live updates stopped; 2 messages shown"));
}
