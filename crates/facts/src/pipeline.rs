//! Batch pipeline resolving many filings with independent per-filing outcomes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use facts_core::{
    CanonicalRecord, Diagnostic, ExportedRecord, FactError, FilingInput, FilingProcessor,
    RecordStore, Result,
};
use facts_edinet::EdinetProcessor;
use facts_store::JsonFileStore;

use crate::config::PipelineConfig;

/// Outcome of one filing within a batch.
#[derive(Debug)]
pub enum FilingOutcome {
    /// Facts were resolved for at least one year.
    Success {
        /// Filing identifier.
        doc_id: String,
        /// The canonical record.
        record: CanonicalRecord,
        /// Where the record was exported, when a store is configured.
        location: Option<String>,
        /// Recoverable conditions observed during resolution.
        diagnostics: Vec<Diagnostic>,
    },
    /// The filing resolved but disclosed no facts for either year.
    Empty {
        /// Filing identifier.
        doc_id: String,
        /// The record, carrying entity metadata only.
        record: CanonicalRecord,
        /// Recoverable conditions observed during resolution.
        diagnostics: Vec<Diagnostic>,
    },
    /// The filing could not be resolved or exported. Nothing was emitted for it.
    Failed {
        /// Filing identifier.
        doc_id: String,
        /// Why it failed.
        error: FactError,
    },
}

impl FilingOutcome {
    /// Returns the filing identifier.
    #[must_use]
    pub fn doc_id(&self) -> &str {
        match self {
            Self::Success { doc_id, .. } | Self::Empty { doc_id, .. } | Self::Failed { doc_id, .. } => {
                doc_id
            }
        }
    }

    /// Returns the record, unless the filing failed.
    #[must_use]
    pub const fn record(&self) -> Option<&CanonicalRecord> {
        match self {
            Self::Success { record, .. } | Self::Empty { record, .. } => Some(record),
            Self::Failed { .. } => None,
        }
    }

    /// Returns true for [`FilingOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true for [`FilingOutcome::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One outcome per filing.
    pub outcomes: Vec<FilingOutcome>,
}

impl BatchReport {
    /// Number of filings in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if the batch was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of filings with at least one year block.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of filings that resolved without any year block.
    #[must_use]
    pub fn empty(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FilingOutcome::Empty { .. }))
            .count()
    }

    /// Number of filings that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Records of every filing that did not fail.
    pub fn records(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.outcomes.iter().filter_map(FilingOutcome::record)
    }
}

/// Runs a [`FilingProcessor`] over many filings and optionally exports the results.
///
/// Filings are resolved on blocking workers, at most `concurrency` at a time.
/// A failing filing never aborts the batch.
///
/// # Example
///
/// ```rust,ignore
/// use facts::{FilingPipeline, JsonFileStore};
/// use std::sync::Arc;
///
/// let pipeline = FilingPipeline::edinet()
///     .with_store(Arc::new(JsonFileStore::from_env()?))
///     .with_concurrency(8);
///
/// let report = pipeline.process_paths(&paths).await;
/// println!("{} ok, {} empty, {} failed", report.succeeded(), report.empty(), report.failed());
/// ```
pub struct FilingPipeline {
    processor: Arc<dyn FilingProcessor>,
    store: Option<Arc<dyn RecordStore>>,
    concurrency: usize,
}

impl std::fmt::Debug for FilingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilingPipeline")
            .field("processor", &self.processor.name())
            .field("store", &self.store.as_ref().map(|s| s.name()))
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl FilingPipeline {
    /// Create a pipeline around a processor, without export.
    #[must_use]
    pub fn new(processor: Arc<dyn FilingProcessor>) -> Self {
        Self {
            processor,
            store: None,
            concurrency: PipelineConfig::default().concurrency,
        }
    }

    /// Create a pipeline around the EDINET processor.
    #[must_use]
    pub fn edinet() -> Self {
        Self::new(Arc::new(EdinetProcessor::new()))
    }

    /// Create an EDINET pipeline from configuration.
    ///
    /// A configured dataset path attaches a [`JsonFileStore`].
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut processor = EdinetProcessor::new();
        if let Some(report_type) = config.default_report_type {
            processor = processor.with_default_report_type(report_type);
        }

        let pipeline = Self::new(Arc::new(processor)).with_concurrency(config.concurrency);
        match &config.dataset_path {
            Some(path) => pipeline.with_store(Arc::new(JsonFileStore::new(path))),
            None => pipeline,
        }
    }

    /// Set the store records are exported to.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        debug!(store = store.name(), "Attaching record store");
        self.store = Some(store);
        self
    }

    /// Set the maximum number of filings resolved at once, at least 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the maximum number of filings resolved at once.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the processor.
    #[must_use]
    pub fn processor(&self) -> &dyn FilingProcessor {
        self.processor.as_ref()
    }

    /// Returns the store, if configured.
    #[must_use]
    pub fn store(&self) -> Option<&dyn RecordStore> {
        self.store.as_deref()
    }

    /// Resolves one filing and exports it if a store is configured.
    #[instrument(skip(self, input), fields(doc_id = %input.doc_id))]
    pub async fn process_one(&self, input: FilingInput) -> FilingOutcome {
        let doc_id = input.doc_id.clone();
        let processor = Arc::clone(&self.processor);

        let processed = match tokio::task::spawn_blocking(move || processor.process(&input)).await
        {
            Ok(Ok(processed)) => processed,
            Ok(Err(error)) => {
                warn!(doc_id = %doc_id, error = %error, "Filing failed");
                return FilingOutcome::Failed { doc_id, error };
            }
            Err(join_error) => {
                warn!(doc_id = %doc_id, error = %join_error, "Worker abandoned filing");
                return FilingOutcome::Failed {
                    doc_id,
                    error: FactError::Other(format!("worker abandoned filing: {join_error}")),
                };
            }
        };

        let record = processed.record;
        let diagnostics = processed.diagnostics;
        if record.is_empty() {
            debug!(doc_id = %doc_id, "No facts resolved for either year");
            return FilingOutcome::Empty {
                doc_id,
                record,
                diagnostics,
            };
        }

        let location = match &self.store {
            Some(store) => match Self::export(store.as_ref(), &record).await {
                Ok(location) => Some(location),
                Err(error) => {
                    warn!(doc_id = %doc_id, store = store.name(), error = %error, "Export failed");
                    return FilingOutcome::Failed { doc_id, error };
                }
            },
            None => None,
        };

        FilingOutcome::Success {
            doc_id,
            record,
            location,
            diagnostics,
        }
    }

    async fn export(store: &dyn RecordStore, record: &CanonicalRecord) -> Result<String> {
        let exported = ExportedRecord::from_record(record, Utc::now())?;
        store.put(&exported).await
    }

    /// Resolves a batch of filings, reporting outcomes in input order.
    pub async fn process_batch<I>(&self, inputs: I) -> BatchReport
    where
        I: IntoIterator<Item = FilingInput>,
    {
        let outcomes: Vec<FilingOutcome> = stream::iter(inputs)
            .map(|input| self.process_one(input))
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = BatchReport { outcomes };
        info!(
            total = report.len(),
            succeeded = report.succeeded(),
            empty = report.empty(),
            failed = report.failed(),
            "Batch complete"
        );
        report
    }

    /// Reads and resolves instance documents from disk.
    ///
    /// A file that cannot be read fails on its own; the rest of the batch continues.
    pub async fn process_paths(&self, paths: &[PathBuf]) -> BatchReport {
        let outcomes: Vec<FilingOutcome> = stream::iter(paths.iter().cloned())
            .map(|path| async move {
                match Self::read_input(path.clone()).await {
                    Ok(input) => self.process_one(input).await,
                    Err(error) => {
                        warn!(path = %path.display(), error = %error, "Could not read filing");
                        FilingOutcome::Failed {
                            doc_id: path.display().to_string(),
                            error,
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = BatchReport { outcomes };
        info!(
            total = report.len(),
            succeeded = report.succeeded(),
            empty = report.empty(),
            failed = report.failed(),
            "Batch complete"
        );
        report
    }

    async fn read_input(path: PathBuf) -> Result<FilingInput> {
        tokio::task::spawn_blocking(move || FilingInput::from_path(&path))
            .await
            .map_err(|e| FactError::Other(format!("worker abandoned read: {e}")))?
    }
}

/// Collects `.xbrl` instance documents under the given paths, sorted.
///
/// Directories are searched recursively; files are taken as given.
///
/// # Errors
/// Returns an error if a path does not exist or a directory cannot be read.
pub fn collect_instance_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut files)?;
        } else if path.exists() {
            files.push(path.clone());
        } else {
            return Err(FactError::InvalidParameter(format!(
                "no such file or directory: {}",
                path.display()
            )));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("xbrl") {
            files.push(path);
        }
    }
    Ok(())
}
