use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::common::types::CHAT_COLLECTION;
use crate::common::{ChatMessage, FeedCommand, FeedEvent};
use crate::storage::{DocumentStore, StoreError};

use super::history::{HistoryLoader, HistoryPage};
use super::live::{LiveTailWatcher, Subscription, TailEvent};
use super::merge::{Feed, Placement};

#[derive(Debug, Error)]
#[error("chat session is closed")]
pub struct SessionClosed;

/// Everything one open chat page owns: the feed, its seen-id set, the history
/// cursor and the live subscription.
///
/// All feed mutations go through `&mut self`, so history pages and live
/// arrivals are applied one at a time in whatever order they come in.
pub struct ChatSession {
    store: Arc<dyn DocumentStore>,
    feed: Feed,
    history: HistoryLoader,
    subscription: Option<Subscription>,
    tail: Option<mpsc::Receiver<TailEvent>>,
    closed: bool,
}

impl ChatSession {
    /// A session with an empty feed and no live subscription yet.
    pub fn new(store: Arc<dyn DocumentStore>, page_size: usize) -> Self {
        Self {
            history: HistoryLoader::new(store.clone(), page_size),
            store,
            feed: Feed::new(),
            subscription: None,
            tail: None,
            closed: false,
        }
    }

    /// Start following the live tail, then load the first page. Tail events
    /// raised while the page is in flight stay queued until the caller reads
    /// them; the seen-id set drops any overlap with the page.
    pub async fn mount(store: Arc<dyn DocumentStore>, page_size: usize) -> Result<Self, StoreError> {
        let mut session = Self::new(store, page_size);
        session.subscribe_live().await?;
        session.load_first_page().await?;
        log::info!(
            "Chat session mounted with {} messages (has_more={})",
            session.feed.len(),
            session.history.has_more()
        );
        Ok(session)
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn has_more(&self) -> bool {
        self.history.has_more()
    }

    pub fn is_live(&self) -> bool {
        self.tail.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub async fn load_first_page(&mut self) -> Result<Vec<ChatMessage>, StoreError> {
        let page = self.history.load_first_page().await?;
        Ok(self.apply_page(page))
    }

    /// Append the next older page. A no-op once history is exhausted or the
    /// session is torn down.
    pub async fn load_more(&mut self) -> Result<Vec<ChatMessage>, StoreError> {
        if self.closed || !self.history.has_more() {
            return Ok(Vec::new());
        }
        let page = self.history.load_next_page().await?;
        Ok(self.apply_page(page))
    }

    /// Admit a fetched page at the tail. Results landing after teardown are
    /// dropped.
    pub fn apply_page(&mut self, page: HistoryPage) -> Vec<ChatMessage> {
        if self.closed {
            log::debug!("Discarding {} history messages after teardown", page.messages.len());
            return Vec::new();
        }
        self.feed.admit_page(page.messages)
    }

    pub async fn subscribe_live(&mut self) -> Result<(), StoreError> {
        if self.closed || self.subscription.is_some() {
            return Ok(());
        }
        let (subscription, tail) = LiveTailWatcher::subscribe(self.store.as_ref()).await?;
        self.subscription = Some(subscription);
        self.tail = Some(tail);
        Ok(())
    }

    /// Wait for the next event from the live listener. Returns `None` when
    /// there is no live subscription.
    pub async fn next_tail_event(&mut self) -> Option<TailEvent> {
        let tail = self.tail.as_mut()?;
        let event = tail.recv().await;
        if event.is_none() {
            self.tail = None;
        }
        event
    }

    /// Apply one live event. Returns the message if it was new and is now at
    /// the head of the feed.
    pub fn apply_tail(&mut self, event: TailEvent) -> Option<ChatMessage> {
        if self.closed {
            return None;
        }
        match event {
            TailEvent::Candidate(message) => {
                if self.feed.admit(message.clone(), Placement::Head) {
                    log::debug!("Live message {} from {}", message.id, message.sender);
                    Some(message)
                } else {
                    None
                }
            }
            TailEvent::Dropped(reason) => {
                log::warn!(
                    "Live updates stopped ({}); feed stays as loaded",
                    reason.as_deref().unwrap_or("stream ended")
                );
                self.drop_live();
                None
            }
        }
    }

    /// Write a new chat message. Blank bodies are ignored. The message shows
    /// up in the feed through the live tail, not here.
    pub async fn send(&self, sender: &str, body: &str) -> Result<Option<String>, StoreError> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        let id = self
            .store
            .write(CHAT_COLLECTION, ChatMessage::outgoing_fields(sender, body))
            .await?;
        log::info!("Sent message {id} as {sender}");
        Ok(Some(id))
    }

    /// Stop live updates and refuse further feed mutations. Idempotent.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.drop_live();
        log::info!("Chat session torn down with {} messages", self.feed.len());
    }

    fn drop_live(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.tail = None;
    }

    /// Serve the chat page until the command channel closes or `shutdown`
    /// flips. Every feed mutation happens on this task.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<FeedCommand>,
        events: mpsc::Sender<FeedEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mounted = FeedEvent::Mounted {
            messages: self.feed.to_vec(),
            has_more: self.history.has_more(),
        };
        if events.send(mounted).await.is_err() {
            self.teardown();
            return;
        }

        loop {
            // accepted commands are served before a pending shutdown
            tokio::select! {
                biased;
                command = commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle_command(command, &events, &mut shutdown).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                Some(event) = recv_tail(&mut self.tail) => {
                    let stopped = matches!(event, TailEvent::Dropped(_));
                    if let Some(message) = self.apply_tail(event) {
                        if events.send(FeedEvent::MessageArrived(message)).await.is_err() {
                            break;
                        }
                    } else if stopped && events.send(FeedEvent::LiveStopped).await.is_err() {
                        break;
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        self.teardown();
    }

    /// Returns `false` once the session should stop.
    async fn handle_command(
        &mut self,
        command: FeedCommand,
        events: &mpsc::Sender<FeedEvent>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        let event = match command {
            FeedCommand::LoadMore => {
                if !self.history.has_more() {
                    return true;
                }
                let result = tokio::select! {
                    biased;
                    result = self.history.load_next_page() => result,
                    _ = shutdown.changed() => {
                        log::debug!("Teardown during history fetch; result dropped");
                        return false;
                    }
                };
                match result {
                    Ok(page) => {
                        let has_more = page.has_more;
                        FeedEvent::PageLoaded {
                            messages: self.apply_page(page),
                            has_more,
                        }
                    }
                    Err(err) => {
                        log::warn!("Failed to load older messages: {err}");
                        FeedEvent::LoadFailed(err.to_string())
                    }
                }
            }
            FeedCommand::SendMessage { sender, body } => match self.send(&sender, &body).await {
                Ok(_) => return true,
                Err(err) => {
                    log::warn!("Failed to send message: {err}");
                    FeedEvent::SendFailed(err.to_string())
                }
            },
        };

        events.send(event).await.is_ok()
    }
}

async fn recv_tail(tail: &mut Option<mpsc::Receiver<TailEvent>>) -> Option<TailEvent> {
    match tail {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// A [`ChatSession`] running on its own task.
pub struct SessionHandle {
    commands: mpsc::Sender<FeedCommand>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn spawn(session: ChatSession, events: mpsc::Sender<FeedEvent>) -> Self {
        let (commands, command_receiver) = mpsc::channel(32);
        let (shutdown, shutdown_receiver) = watch::channel(false);
        let task = tokio::spawn(session.run(command_receiver, events, shutdown_receiver));
        Self {
            commands,
            shutdown,
            task,
        }
    }

    pub async fn send(&self, command: FeedCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).await.map_err(|_| SessionClosed)
    }

    /// Ask the session to stop. In-flight history results are discarded.
    pub fn teardown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub async fn join(self) {
        self.teardown();
        if let Err(err) = self.task.await {
            log::error!("Chat session task failed: {err}");
        }
    }
}
