use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::common::ChatMessage;
use crate::common::types::{CHAT_COLLECTION, FIELD_CREATED_AT};
use crate::storage::{Direction, DocumentStore, OrderedQuery, Snapshot, SnapshotStream, StoreError};

const TAIL_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailState {
    /// No delivery seen yet.
    Uninitialized,
    /// The first delivery was discarded; later ones carry candidates.
    Armed,
}

/// What the listener task hands to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TailEvent {
    /// Newest stored message after a change. May already be in the feed.
    Candidate(ChatMessage),
    /// The live view ended or failed; nothing more will arrive.
    Dropped(Option<String>),
}

/// Discard-first filter over tail snapshots.
///
/// The first delivery restates the state at subscribe time, which the first
/// history page covers, so it is dropped. Every later delivery follows a
/// change and carries the newest message.
#[derive(Debug)]
pub struct TailFilter {
    state: TailState,
}

impl Default for TailFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TailFilter {
    pub fn new() -> Self {
        Self {
            state: TailState::Uninitialized,
        }
    }

    pub fn state(&self) -> TailState {
        self.state
    }

    pub fn observe(&mut self, snapshot: &Snapshot) -> Option<ChatMessage> {
        match self.state {
            TailState::Uninitialized => {
                self.state = TailState::Armed;
                log::debug!(
                    "Live tail armed ({} documents in first delivery discarded)",
                    snapshot.documents.len()
                );
                None
            }
            TailState::Armed => snapshot.documents.first().map(ChatMessage::from_document),
        }
    }
}

pub(crate) fn tail_query() -> OrderedQuery {
    OrderedQuery::new(CHAT_COLLECTION, FIELD_CREATED_AT, Direction::Descending, 1)
}

/// Handle to a running listener task.
#[derive(Debug)]
pub struct Subscription {
    task: Option<AbortHandle>,
}

impl Subscription {
    /// Stop the listener. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            log::debug!("Live tail unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Follows the single newest chat message.
pub struct LiveTailWatcher;

impl LiveTailWatcher {
    /// Open the live view and spawn the listener task. Candidates arrive on
    /// the returned receiver until [`Subscription::unsubscribe`] is called or
    /// the view drops.
    pub async fn subscribe(
        store: &dyn DocumentStore,
    ) -> Result<(Subscription, mpsc::Receiver<TailEvent>), StoreError> {
        let stream = store.watch_ordered(&tail_query()).await?;
        let (sender, receiver) = mpsc::channel(TAIL_CHANNEL_CAPACITY);
        let task = tokio::spawn(listen(stream, sender));

        Ok((
            Subscription {
                task: Some(task.abort_handle()),
            },
            receiver,
        ))
    }
}

async fn listen(mut stream: SnapshotStream, sender: mpsc::Sender<TailEvent>) {
    let mut filter = TailFilter::new();
    loop {
        match stream.next().await {
            Some(Ok(snapshot)) => {
                let Some(candidate) = filter.observe(&snapshot) else {
                    continue;
                };
                if sender.send(TailEvent::Candidate(candidate)).await.is_err() {
                    log::debug!("Live tail receiver gone; stopping listener");
                    break;
                }
            }
            Some(Err(err)) => {
                log::warn!("Live tail subscription failed: {err}");
                let _ = sender.send(TailEvent::Dropped(Some(err.to_string()))).await;
                break;
            }
            None => {
                log::warn!("Live tail subscription closed by the store");
                let _ = sender.send(TailEvent::Dropped(None)).await;
                break;
            }
        }
    }
}
