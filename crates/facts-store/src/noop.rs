//! No-op record store.

use async_trait::async_trait;
use facts_core::{ExportedRecord, RecordKey, RecordStore, Result};
use tracing::trace;

/// A no-op store that doesn't persist anything.
///
/// `put` reports where the record would have gone; every read comes back empty.
/// Useful for dry runs that validate export without writing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl NoopStore {
    /// Create a new no-op store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecordStore for NoopStore {
    fn name(&self) -> &str {
        "noop"
    }

    async fn put(&self, record: &ExportedRecord) -> Result<String> {
        trace!("NoopStore: put called, doing nothing");
        Ok(record.key().to_string())
    }

    async fn get(&self, _key: &RecordKey) -> Result<Option<ExportedRecord>> {
        trace!("NoopStore: get called, returning None");
        Ok(None)
    }

    async fn keys(&self) -> Result<Vec<RecordKey>> {
        trace!("NoopStore: keys called, returning nothing");
        Ok(Vec::new())
    }

    async fn clear(&self) -> Result<()> {
        trace!("NoopStore: clear called, doing nothing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::exported;
    use facts_core::ReportType;

    #[tokio::test]
    async fn test_noop_store() {
        let store = NoopStore::new();
        let record = exported("7203", "2025-03-31", ReportType::Annual, 100);

        assert_eq!(store.put(&record).await.unwrap(), "annual/2025FY/7203");
        assert!(store.get(&record.key()).await.unwrap().is_none());
        assert!(store.keys().await.unwrap().is_empty());
        assert!(store.clear().await.is_ok());
        assert_eq!(store.name(), "noop");
    }
}
