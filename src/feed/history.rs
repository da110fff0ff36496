use std::sync::Arc;

use crate::common::ChatMessage;
use crate::common::types::{CHAT_COLLECTION, FIELD_CREATED_AT};
use crate::storage::{Direction, DocumentStore, OrderedQuery, PageCursor, StoreError};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of history, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryPage {
    pub messages: Vec<ChatMessage>,
    pub cursor: Option<PageCursor>,
    pub has_more: bool,
}

/// Pages backwards through the chat collection.
///
/// The cursor and the `has_more` flag only move when a fetch succeeds, so a
/// failed or abandoned fetch can simply be retried.
pub struct HistoryLoader {
    store: Arc<dyn DocumentStore>,
    query: OrderedQuery,
    cursor: Option<PageCursor>,
    has_more: bool,
}

impl HistoryLoader {
    pub fn new(store: Arc<dyn DocumentStore>, page_size: usize) -> Self {
        Self {
            store,
            query: OrderedQuery::new(
                CHAT_COLLECTION,
                FIELD_CREATED_AT,
                Direction::Descending,
                page_size.max(1),
            ),
            cursor: None,
            has_more: true,
        }
    }

    pub fn page_size(&self) -> usize {
        self.query.limit
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub async fn load_first_page(&mut self) -> Result<HistoryPage, StoreError> {
        self.fetch(None).await
    }

    /// Fetch the page after the cursor. Without a cursor, or after a short
    /// page, this is a no-op that leaves the store alone.
    pub async fn load_next_page(&mut self) -> Result<HistoryPage, StoreError> {
        let cursor = match (&self.cursor, self.has_more) {
            (Some(cursor), true) => cursor.clone(),
            _ => {
                return Ok(HistoryPage {
                    messages: Vec::new(),
                    cursor: self.cursor.clone(),
                    has_more: self.has_more,
                });
            }
        };
        self.fetch(Some(&cursor)).await
    }

    async fn fetch(&mut self, after: Option<&PageCursor>) -> Result<HistoryPage, StoreError> {
        let page = self.store.query_ordered(&self.query, after).await?;

        let has_more = page.documents.len() >= self.query.limit;
        let messages: Vec<ChatMessage> = page
            .documents
            .iter()
            .map(ChatMessage::from_document)
            .collect();

        if page.cursor.is_some() {
            self.cursor = page.cursor;
        }
        self.has_more = has_more;
        log::debug!(
            "Loaded {} history messages (has_more={has_more})",
            messages.len()
        );

        Ok(HistoryPage {
            messages,
            cursor: self.cursor.clone(),
            has_more,
        })
    }
}
