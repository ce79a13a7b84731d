//! SQLite-based record store.

use async_trait::async_trait;
use chrono::Utc;
use facts_core::{
    DataVersion, ExportedRecord, FactError, RecordKey, RecordStore, ReportType, Result,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// SQLite-based store for exported records.
///
/// One row per (report type, data version, security code); a put replaces any
/// existing row for the same key.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| FactError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| FactError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FactError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS exported_records (
                report_type TEXT NOT NULL,
                data_version TEXT NOT NULL,
                security_code TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                data_json TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                PRIMARY KEY (report_type, data_version, security_code)
            )",
            [],
        )
        .map_err(|e| FactError::Store(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_exported_records_doc_id
             ON exported_records(doc_id)",
            [],
        )
        .map_err(|e| FactError::Store(e.to_string()))?;

        debug!("SQLite store schema initialized");
        Ok(())
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FactError::Store(e.to_string()))?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM exported_records", [], |row| row.get(0))
            .map_err(|e| FactError::Store(e.to_string()))?;
        usize::try_from(count).map_err(|e| FactError::Store(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    #[instrument(skip(self, record), fields(key = %record.key(), doc_id = %record.doc_id))]
    async fn put(&self, record: &ExportedRecord) -> Result<String> {
        let key = record.key();
        let data_json = serde_json::to_string(record)?;
        let stored_at = Utc::now().to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| FactError::Store(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO exported_records
             (report_type, data_version, security_code, doc_id, data_json, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                key.report_type.as_str(),
                key.data_version.as_str(),
                key.security_code,
                record.doc_id,
                data_json,
                stored_at
            ],
        )
        .map_err(|e| FactError::Store(e.to_string()))?;

        debug!("Stored record");
        Ok(key.to_string())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &RecordKey) -> Result<Option<ExportedRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FactError::Store(e.to_string()))?;

        let json: Option<String> = conn
            .query_row(
                "SELECT data_json FROM exported_records
                 WHERE report_type = ?1 AND data_version = ?2 AND security_code = ?3",
                params![
                    key.report_type.as_str(),
                    key.data_version.as_str(),
                    key.security_code
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| FactError::Store(e.to_string()))?;

        match json {
            Some(json) => {
                debug!("Record found");
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => {
                debug!("Record not found");
                Ok(None)
            }
        }
    }

    async fn keys(&self) -> Result<Vec<RecordKey>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FactError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT report_type, data_version, security_code FROM exported_records")
            .map_err(|e| FactError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| FactError::Store(e.to_string()))?;

        let mut keys = Vec::new();
        for row in rows {
            let (report_type, data_version, security_code) =
                row.map_err(|e| FactError::Store(e.to_string()))?;
            keys.push(RecordKey {
                report_type: report_type.parse::<ReportType>()?,
                data_version: DataVersion::new(data_version),
                security_code,
            });
        }
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FactError::Store(e.to_string()))?;
        conn.execute("DELETE FROM exported_records", [])
            .map_err(|e| FactError::Store(e.to_string()))?;
        debug!("Cleared SQLite store");
        Ok(())
    }
}
