#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/facts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for resolving business-reporting filings.
//!
//! This crate provides the foundational abstractions shared by the resolution
//! engine, the export collaborators, and the batch pipeline:
//!
//! - [`FilingSource`](source::FilingSource) - Lists filings and downloads their archives
//! - [`FilingProcessor`](processor::FilingProcessor) - Resolves one filing into a canonical record
//! - [`RecordStore`](store::RecordStore) - Persists exported records
//! - [`CanonicalRecord`](record::CanonicalRecord) - The per-filing output
//! - [`Diagnostic`](diagnostic::Diagnostic) - Recoverable conditions returned alongside results

/// Diagnostics returned alongside resolution results.
pub mod diagnostic;
/// Error types for filing operations.
pub mod error;
/// Canonical keys and output metrics.
pub mod keys;
/// Processor trait for resolving filings.
pub mod processor;
/// Resolved values and the canonical record.
pub mod record;
/// Report type, consolidation basis, and data version.
pub mod report;
/// Source trait for retrieving filings.
pub mod source;
/// Store trait for persisting records.
pub mod store;
/// Core data types (RawFact, Period, ContextMap, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use diagnostic::{Diagnostic, Severity};
pub use error::{FactError, Result};
pub use keys::{CanonicalKey, Metric, Statement, ValueKind};
pub use processor::{FilingInput, FilingProcessor, ProcessedFiling};
pub use record::{
    CanonicalRecord, EntityMetadata, FactValue, KeyValues, Metrics, YearBlock, YearBucket,
    normalize_accounting_standard, normalize_security_code,
};
pub use report::{ConsolidationType, DataVersion, ReportType};
pub use source::{ANNUAL_REPORT_FORM_CODE, FilingSource, FilingSummary, is_valid_doc_id};
pub use store::{ExportedRecord, RecordKey, RecordStore, SCHEMA_VERSION, is_valid_security_code};
pub use types::{
    ContextEntry, ContextMap, Period, PeriodAnchors, PeriodKind, PeriodRange, PeriodRole, RawFact,
};
