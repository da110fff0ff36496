use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures::StreamExt;
use futures::channel::mpsc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row, params};
use uuid::Uuid;

use super::database::Database;
use super::document::{
    Direction, Document, FieldValue, Fields, Page, PageCursor, Snapshot, TIMESTAMP_RANK,
};
use super::ensure_parent_dir;
use super::error::StoreError;
use super::query::OrderedQuery;
use super::store::{DocumentStore, SnapshotStream};

struct Watcher {
    query: OrderedQuery,
    sender: mpsc::UnboundedSender<Result<Snapshot, StoreError>>,
}

struct Inner {
    db: Database,
    last_stamp: Option<DateTime<Utc>>,
    watchers: Vec<Watcher>,
}

/// Document store on a single SQLite file, with in-process live views.
///
/// Every field is mirrored into `document_keys` so ordered queries and live
/// views run as bounded, indexed SQL.
pub struct SqliteStore {
    inner: Mutex<Inner>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        ensure_parent_dir(&path).map_err(|err| {
            StoreError::Unavailable(format!(
                "cannot create directory for {}: {err}",
                path.as_ref().display()
            ))
        })?;
        let db = Database::new(&path)?;
        log::info!("Opened document store at {}", path.as_ref().display());
        Self::from_database(db)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_database(Database::in_memory()?)
    }

    fn from_database(db: Database) -> Result<Self, StoreError> {
        // stamps must stay above what is already stored, even if the clock went back
        let last_stamp = newest_timestamp(db.connection())?;
        Ok(Self {
            inner: Mutex::new(Inner {
                db,
                last_stamp,
                watchers: Vec::new(),
            }),
        })
    }

    /// End every live view, as if the backend had dropped the connections.
    pub fn disconnect_watchers(&self) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let dropped = inner.watchers.len();
        inner.watchers.clear();
        log::warn!("Disconnected {dropped} live watchers");
        Ok(())
    }

    pub fn watcher_count(&self) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        inner.watchers.retain(|watcher| !watcher.sender.is_closed());
        Ok(inner.watchers.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

impl Inner {
    /// Strictly increasing clock reading for server timestamps.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn resolve_markers(&mut self, fields: &mut Fields) {
        if !fields.values().any(|value| *value == FieldValue::ServerTimestamp) {
            return;
        }
        let stamp = self.stamp();
        for value in fields.values_mut() {
            if *value == FieldValue::ServerTimestamp {
                *value = FieldValue::Timestamp(stamp);
            }
        }
    }

    /// Push a fresh snapshot to every view of `collection`; drop closed or
    /// failed views.
    fn notify(&mut self, collection: &str) {
        let Inner { db, watchers, .. } = self;
        watchers.retain(|watcher| {
            if watcher.query.collection != collection {
                return !watcher.sender.is_closed();
            }
            let delivery = query_page(db.connection(), &watcher.query, None)
                .map(|documents| Snapshot { documents })
                .map_err(|err| StoreError::Unavailable(err.to_string()));
            let healthy = delivery.is_ok();
            watcher.sender.unbounded_send(delivery).is_ok() && healthy
        });
    }
}

/// Rank plus a value SQLite orders the same way the field orders within
/// that rank.
fn order_key(value: &FieldValue) -> (i64, Value) {
    let key = match value {
        FieldValue::Null | FieldValue::ServerTimestamp => Value::Integer(0),
        FieldValue::Bool(flag) => Value::Integer(i64::from(*flag)),
        FieldValue::Integer(number) => Value::Integer(*number),
        FieldValue::Float(number) => Value::Real(*number),
        FieldValue::Timestamp(at) => Value::Integer(timestamp_key(at)),
        FieldValue::String(text) => Value::Text(text.clone()),
    };
    (value.type_rank(), key)
}

fn timestamp_key(at: &DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt()
        .unwrap_or(if at.timestamp() < 0 { i64::MIN } else { i64::MAX })
}

fn newest_timestamp(conn: &Connection) -> Result<Option<DateTime<Utc>>, StoreError> {
    let newest: Option<i64> = conn.query_row(
        "SELECT MAX(sort_key) FROM document_keys WHERE sort_rank = ?1",
        params![TIMESTAMP_RANK],
        |row| row.get(0),
    )?;
    Ok(newest.map(DateTime::from_timestamp_nanos))
}

fn index_fields(
    conn: &Connection,
    collection: &str,
    id: &str,
    fields: &Fields,
) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM document_keys WHERE collection = ?1 AND id = ?2",
        params![collection, id],
    )?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO document_keys (collection, id, field, sort_rank, sort_key)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (field, value) in fields {
        let (rank, key) = order_key(value);
        stmt.execute(params![collection, id, field, rank, key])?;
    }
    Ok(())
}

fn decode_row(id: String, raw: &str) -> Document {
    match serde_json::from_str::<Fields>(raw) {
        Ok(fields) => Document::new(id, fields),
        Err(err) => {
            log::warn!("Document {id} has unreadable fields ({err}); treating as empty");
            Document::new(id, Fields::new())
        }
    }
}

fn id_and_fields(row: &Row<'_>) -> SqlResult<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn load_collection(conn: &Connection, collection: &str) -> Result<Vec<Document>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, fields
         FROM documents
         WHERE collection = ?1
         ORDER BY seq ASC",
    )?;

    let rows = stmt
        .query_map(params![collection], id_and_fields)?
        .collect::<SqlResult<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .map(|(id, raw)| decode_row(id, &raw))
        .collect())
}

/// One bounded page of `query`, strictly after `after` when given.
fn query_page(
    conn: &Connection,
    query: &OrderedQuery,
    after: Option<&PageCursor>,
) -> Result<Vec<Document>, StoreError> {
    let (order, beyond) = match query.direction {
        Direction::Ascending => ("ASC", ">"),
        Direction::Descending => ("DESC", "<"),
    };
    let after_clause = match after {
        Some(_) => format!("AND (k.sort_rank, k.sort_key, k.id) {beyond} (?4, ?5, ?6)"),
        None => String::new(),
    };
    let sql = format!(
        "SELECT d.id, d.fields
         FROM document_keys k
         JOIN documents d ON d.collection = k.collection AND d.id = k.id
         WHERE k.collection = ?1 AND k.field = ?2 {after_clause}
         ORDER BY k.sort_rank {order}, k.sort_key {order}, k.id {order}
         LIMIT ?3"
    );

    let mut stmt = conn.prepare_cached(&sql)?;
    let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
    let rows = match after {
        Some(cursor) => {
            let (rank, key) = order_key(&cursor.value);
            stmt.query_map(
                params![query.collection, query.order_field, limit, rank, key, cursor.id],
                id_and_fields,
            )?
            .collect::<SqlResult<Vec<_>>>()?
        }
        None => stmt
            .query_map(
                params![query.collection, query.order_field, limit],
                id_and_fields,
            )?
            .collect::<SqlResult<Vec<_>>>()?,
    };

    Ok(rows
        .into_iter()
        .map(|(id, raw)| decode_row(id, &raw))
        .collect())
}

fn load_fields(conn: &Connection, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT fields FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;

    Ok(raw.map(|raw| decode_row(id.to_string(), &raw).fields))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn write(&self, collection: &str, mut fields: Fields) -> Result<String, StoreError> {
        let mut inner = self.lock()?;
        inner.resolve_markers(&mut fields);

        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(&fields)?;
        let tx = inner.db.connection().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO documents (collection, id, fields) VALUES (?1, ?2, ?3)",
            params![collection, id, payload],
        )?;
        index_fields(&tx, collection, &id, &fields)?;
        tx.commit()?;
        log::debug!("Wrote {collection}/{id}");

        inner.notify(collection);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let mut merged = load_fields(inner.db.connection(), collection, id)?.ok_or_else(|| {
            StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }
        })?;
        merged.extend(fields);
        inner.resolve_markers(&mut merged);

        let payload = serde_json::to_string(&merged)?;
        let tx = inner.db.connection().unchecked_transaction()?;
        tx.execute(
            "UPDATE documents SET fields = ?1 WHERE collection = ?2 AND id = ?3",
            params![payload, collection, id],
        )?;
        index_fields(&tx, collection, id, &merged)?;
        tx.commit()?;
        log::debug!("Updated {collection}/{id}");

        inner.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let tx = inner.db.connection().unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        tx.execute(
            "DELETE FROM document_keys WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        tx.commit()?;
        log::debug!("Deleted {collection}/{id}");

        inner.notify(collection);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let inner = self.lock()?;
        load_collection(inner.db.connection(), collection)
    }

    async fn query_ordered(
        &self,
        query: &OrderedQuery,
        after: Option<&PageCursor>,
    ) -> Result<Page, StoreError> {
        let inner = self.lock()?;
        let documents = query_page(inner.db.connection(), query, after)?;
        let cursor = documents.last().and_then(|doc| query.cursor_for(doc));
        Ok(Page { documents, cursor })
    }

    async fn watch_ordered(&self, query: &OrderedQuery) -> Result<SnapshotStream, StoreError> {
        let mut inner = self.lock()?;
        let initial = Snapshot {
            documents: query_page(inner.db.connection(), query, None)?,
        };

        let (sender, receiver) = mpsc::unbounded();
        // the receiver is still in hand, so this cannot fail
        let _ = sender.unbounded_send(Ok(initial));
        inner.watchers.push(Watcher {
            query: query.clone(),
            sender,
        });
        log::debug!(
            "Watching {} ordered by {} (limit {})",
            query.collection,
            query.order_field,
            query.limit
        );

        Ok(receiver.boxed())
    }
}
