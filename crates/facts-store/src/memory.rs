//! In-memory record store.

use async_trait::async_trait;
use facts_core::{ExportedRecord, RecordKey, RecordStore, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Simple in-memory store for testing and dry runs.
///
/// Records live in a `RwLock`-protected `HashMap` and are lost when the store
/// is dropped. Records are cloned on get/put.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<RecordKey, ExportedRecord>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(skip(self, record), fields(key = %record.key()))]
    async fn put(&self, record: &ExportedRecord) -> Result<String> {
        let key = record.key();
        let location = key.to_string();
        let replaced = self
            .records
            .write()
            .await
            .insert(key, record.clone())
            .is_some();
        debug!(replaced, "Stored record in memory");
        Ok(location)
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &RecordKey) -> Result<Option<ExportedRecord>> {
        let records = self.records.read().await;
        match records.get(key) {
            Some(record) => {
                debug!("Memory store hit");
                Ok(Some(record.clone()))
            }
            None => {
                debug!("Memory store miss");
                Ok(None)
            }
        }
    }

    async fn keys(&self) -> Result<Vec<RecordKey>> {
        let mut keys: Vec<RecordKey> = self.records.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().await.clear();
        debug!("Cleared memory store");
        Ok(())
    }
}
