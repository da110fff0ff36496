use async_trait::async_trait;
use futures::stream::BoxStream;

use super::document::{Document, Fields, Page, PageCursor, Snapshot};
use super::error::StoreError;
use super::query::OrderedQuery;

/// Push stream of live view deliveries. The stream ending, or yielding an
/// error, means the subscription is gone.
pub type SnapshotStream = BoxStream<'static, Result<Snapshot, StoreError>>;

/// The hosted-database surface the application depends on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and return its store-assigned id. Every
    /// [`FieldValue::ServerTimestamp`](super::FieldValue::ServerTimestamp)
    /// marker is stamped by the store.
    async fn write(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Merge `fields` into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// All documents of a collection in creation order.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn query_ordered(
        &self,
        query: &OrderedQuery,
        after: Option<&PageCursor>,
    ) -> Result<Page, StoreError>;

    /// Subscribe to a live view. The current state is delivered first, then
    /// one snapshot per change to the collection.
    async fn watch_ordered(&self, query: &OrderedQuery) -> Result<SnapshotStream, StoreError>;
}
