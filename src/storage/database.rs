use rusqlite::{Connection, Result as SqlResult};
use std::path::Path;

/// Base database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> SqlResult<()> {
        // seq keeps creation order; ids are unique per collection
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                fields TEXT NOT NULL,
                UNIQUE (collection, id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
            [],
        )?;

        // one sortable key per document field; `sort_key` is untyped so integers,
        // reals and text keep their storage class
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS document_keys (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                field TEXT NOT NULL,
                sort_rank INTEGER NOT NULL,
                sort_key,
                PRIMARY KEY (collection, id, field)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_document_keys_order
             ON document_keys(collection, field, sort_rank, sort_key, id)",
            [],
        )?;

        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
