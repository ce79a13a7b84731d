//! Processor trait for resolving filings into canonical records.
//!
//! This module defines the [`FilingProcessor`] trait implemented by each
//! filing-format engine, together with its input and output types.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostic::Diagnostic;
use crate::error::{FactError, Result};
use crate::record::CanonicalRecord;
use crate::report::ReportType;

/// A filing handed to a processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilingInput {
    /// Filing identifier, derived from storage layout rather than content.
    pub doc_id: String,
    /// Instance document text.
    pub content: String,
    /// Kind of filing, when known.
    pub report_type: Option<ReportType>,
    /// File the content was read from.
    pub source: Option<PathBuf>,
}

impl FilingInput {
    /// Creates an input from in-memory content.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            content: content.into(),
            report_type: None,
            source: None,
        }
    }

    /// Sets the report type.
    #[must_use]
    pub fn with_report_type(mut self, report_type: ReportType) -> Self {
        self.report_type = Some(report_type);
        self
    }

    /// Reads an instance document stored as `.../{doc_id}/{instance}.xbrl`.
    ///
    /// The filing identifier is the name of the containing directory, falling
    /// back to the file stem. The report type is derived from the file name
    /// when it follows the EDINET naming convention.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let doc_id = Self::doc_id_for(path).ok_or_else(|| {
            FactError::InvalidParameter(format!(
                "cannot derive a filing identifier from {}",
                path.display()
            ))
        })?;
        let report_type = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(ReportType::from_instance_name);
        debug!(
            doc_id = %doc_id,
            path = %path.display(),
            bytes = content.len(),
            "Read filing"
        );

        Ok(Self {
            doc_id,
            content,
            report_type,
            source: Some(path.to_path_buf()),
        })
    }

    fn doc_id_for(path: &Path) -> Option<String> {
        path.parent()
            .and_then(Path::file_name)
            .or_else(|| path.file_stem())
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// Result of resolving one filing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFiling {
    /// The canonical record.
    pub record: CanonicalRecord,
    /// Taxonomy date marker from the schema reference, e.g. `2025-03-31`.
    pub taxonomy_version: Option<String>,
    /// Recoverable conditions observed during resolution.
    pub diagnostics: Vec<Diagnostic>,
}

impl ProcessedFiling {
    /// Returns true if no facts were resolved for either year.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.record.is_empty()
    }
}

/// Engine that resolves filings of one format into canonical records.
///
/// Resolution is synchronous and CPU-bound; implementations hold no state that
/// crosses filings, so one instance can serve many workers.
pub trait FilingProcessor: Send + Sync + Debug {
    /// Returns the name of this processor.
    fn name(&self) -> &str;

    /// Returns a description of this processor.
    fn description(&self) -> &str;

    /// Resolves one filing.
    ///
    /// # Errors
    /// Returns an error only if the filing is structurally unusable. Missing
    /// facts are represented as nulls and diagnostics.
    fn process(&self, input: &FilingInput) -> Result<ProcessedFiling>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_derives_identity() {
        let dir = tempfile::tempdir().unwrap();
        let filing_dir = dir.path().join("S100ABCD");
        std::fs::create_dir_all(&filing_dir).unwrap();
        let file = filing_dir.join("jpcrp030000-asr-001_E00001-000_2025-03-31_01_2025-06-25.xbrl");
        std::fs::write(&file, "<xbrli:xbrl/>").unwrap();

        let input = FilingInput::from_path(&file).unwrap();
        assert_eq!(input.doc_id, "S100ABCD");
        assert_eq!(input.report_type, Some(ReportType::Annual));
        assert_eq!(input.content, "<xbrli:xbrl/>");
        assert_eq!(input.source.as_deref(), Some(file.as_path()));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = FilingInput::from_path("/nonexistent/S100ABCD/instance.xbrl").unwrap_err();
        assert!(matches!(err, FactError::Io(_)));
    }

    #[test]
    fn test_builder() {
        let input = FilingInput::new("S100TEST", "<xbrl/>").with_report_type(ReportType::Quarterly);
        assert_eq!(input.report_type, Some(ReportType::Quarterly));
        assert!(input.source.is_none());
    }
}
