#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use warung::common::ChatMessage;
use warung::common::types::CHAT_COLLECTION;
use warung::feed::Feed;
use warung::storage::{
    Document, DocumentStore, Fields, OrderedQuery, Page, PageCursor, SnapshotStream, SqliteStore,
    StoreError,
};

/// SQLite store with switches for failures, latency and query counting.
pub struct ScriptedStore {
    pub inner: SqliteStore,
    fail_queries: AtomicBool,
    query_delay_ms: AtomicU64,
    queries: AtomicUsize,
    write_after_query: Mutex<Option<Fields>>,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteStore::in_memory().unwrap(),
            fail_queries: AtomicBool::new(false),
            query_delay_ms: AtomicU64::new(0),
            queries: AtomicUsize::new(0),
            write_after_query: Mutex::new(None),
        })
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn delay_queries(&self, delay: Duration) {
        self.query_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Write a chat message right after the next query has been answered,
    /// as another client would while that page is on its way back.
    pub fn write_after_next_query(&self, fields: Fields) {
        *self.write_after_query.lock().unwrap() = Some(fields);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn write(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.inner.write(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.inner.list(collection).await
    }

    async fn query_ordered(
        &self,
        query: &OrderedQuery,
        after: Option<&PageCursor>,
    ) -> Result<Page, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let delay = self.query_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("scripted outage".to_string()));
        }
        let page = self.inner.query_ordered(query, after).await?;
        let pending = self.write_after_query.lock().unwrap().take();
        if let Some(fields) = pending {
            self.inner.write(CHAT_COLLECTION, fields).await?;
        }
        Ok(page)
    }

    async fn watch_ordered(&self, query: &OrderedQuery) -> Result<SnapshotStream, StoreError> {
        self.inner.watch_ordered(query).await
    }
}

/// Write `count` chat messages, oldest first, and return their ids in write
/// order.
pub async fn seed_messages(store: &dyn DocumentStore, count: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(count);
    for n in 0..count {
        let fields = ChatMessage::outgoing_fields("Bunda", &format!("pesan {n}"));
        ids.push(store.write(CHAT_COLLECTION, fields).await.unwrap());
    }
    ids
}

pub fn assert_no_duplicates(feed: &Feed) {
    let mut seen = HashSet::new();
    for message in feed.iter() {
        assert!(seen.insert(message.id.clone()), "duplicate {}", message.id);
    }
}

/// Stamped messages must not increase from head to tail.
pub fn assert_newest_first(feed: &Feed) {
    let stamps: Vec<_> = feed.iter().filter_map(|message| message.created_at).collect();
    assert!(
        stamps.windows(2).all(|pair| pair[0] >= pair[1]),
        "feed is not newest first"
    );
}
