pub mod database;
pub mod document;
pub mod error;
pub mod query;
pub mod sqlite_store;
pub mod store;

pub use document::{Direction, Document, FieldValue, Fields, Page, PageCursor, Snapshot};
pub use error::StoreError;
pub use query::OrderedQuery;
pub use sqlite_store::SqliteStore;
pub use store::{DocumentStore, SnapshotStream};

use std::fs;
use std::path::Path;

/// Ensure the directory holding a database file exists.
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
