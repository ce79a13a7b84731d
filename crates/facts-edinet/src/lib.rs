#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/facts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! EDINET XBRL resolution engine.
//!
//! This crate turns one instance document into a canonical record:
//!
//! - Fact extraction from the parsed document tree
//! - Context resolution and current/prior period inference
//! - Period classification, segment filtering and ordered tag matching
//! - Consolidated versus non-consolidated resolution
//! - Alternate-concept chains and year-block emission
//!
//! It also retrieves filings: [`EdinetClient`] talks to the EDINET API v2 and
//! [`extract_instances`] unpacks the downloaded archives.
//!
//! # Example
//!
//! ```no_run
//! use facts_core::{FilingInput, FilingProcessor};
//! use facts_edinet::EdinetProcessor;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = FilingInput::from_path("raw_xbrl/2025/S100ABCD/jpcrp030000-asr-001.xbrl")?;
//!     let processed = EdinetProcessor::new().process(&input)?;
//!
//!     if let Some(current) = &processed.record.current_year {
//!         println!("{} metrics disclosed", current.disclosed_count());
//!     }
//!     for diagnostic in &processed.diagnostics {
//!         println!("{diagnostic}");
//!     }
//!     Ok(())
//! }
//! ```

/// Assembly of year buckets into the canonical record.
pub mod aggregate;
/// Filing archive extraction.
pub mod archive;
/// EDINET API v2 client.
pub mod client;
/// Consolidated versus non-consolidated candidate resolution.
pub mod consolidation;
/// Context map and period anchors.
pub mod context;
/// Document parsing and fact extraction.
pub mod document;
/// Period classification, tag matching and value parsing.
pub mod matcher;
/// Per-year statement buckets and entity metadata.
pub mod normalizer;
/// Ordered keyword tables.
pub mod tags;

pub use aggregate::{aggregate, resolve_metric, year_block};
pub use archive::{existing_instances, extract_instances, extract_instances_from};
pub use client::{
    API_KEY_ENV, EdinetClient, backoff_delay, is_retryable, parse_document_list, validate_api_key,
};
pub use consolidation::resolve_consolidation;
pub use context::{ContextResolution, derive_anchors, resolve_contexts};
pub use document::{ExtractedDocument, extract_facts, parse_document};
pub use matcher::{
    Classification, classify, has_member_dimension, is_consolidated_context, match_tag,
    parse_consolidation_flag, parse_value,
};
pub use normalizer::{FactNormalizer, NormalizedFiling};
pub use tags::{
    BS_TAGS, CF_TAGS, DEI_TAGS, DIVIDEND_TAGS, DeiField, PL_TAGS, TagTable, table_for,
};

use facts_core::{FilingInput, FilingProcessor, ProcessedFiling, ReportType, Result, Severity};
use tracing::{debug, instrument, warn};

/// Processor for EDINET XBRL instance documents.
///
/// Holds no per-filing state; one instance can be shared across workers.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdinetProcessor {
    default_report_type: ReportType,
}

impl EdinetProcessor {
    /// Creates a processor that treats filings of unknown type as annual.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default_report_type: ReportType::Annual,
        }
    }

    /// Sets the report type used when the input does not carry one.
    #[must_use]
    pub const fn with_default_report_type(mut self, report_type: ReportType) -> Self {
        self.default_report_type = report_type;
        self
    }

    /// Returns the report type used when the input does not carry one.
    #[must_use]
    pub const fn default_report_type(&self) -> ReportType {
        self.default_report_type
    }

    /// Resolves instance document text into a canonical record.
    ///
    /// This is a pure function of its arguments; diagnostics are returned,
    /// never logged.
    ///
    /// # Errors
    /// Returns an error if the document is not well-formed XML or is not an
    /// XBRL instance.
    pub fn resolve(
        &self,
        doc_id: &str,
        content: &str,
        report_type: ReportType,
    ) -> Result<ProcessedFiling> {
        let document = parse_document(doc_id, content)?;
        let extracted = extract_facts(&document, doc_id);
        let ContextResolution {
            contexts,
            anchors,
            diagnostics: mut context_diagnostics,
        } = resolve_contexts(&document);

        let normalized =
            FactNormalizer::new(&extracted.facts, &contexts, anchors).normalize(doc_id, report_type);
        let (record, diagnostics) = aggregate(normalized);

        context_diagnostics.extend(diagnostics);
        Ok(ProcessedFiling {
            record,
            taxonomy_version: extracted.taxonomy_version,
            diagnostics: context_diagnostics,
        })
    }
}

impl FilingProcessor for EdinetProcessor {
    fn name(&self) -> &str {
        "EDINET"
    }

    fn description(&self) -> &str {
        "EDINET XBRL resolver for annual and quarterly securities reports"
    }

    #[instrument(skip(self, input), fields(doc_id = %input.doc_id))]
    fn process(&self, input: &FilingInput) -> Result<ProcessedFiling> {
        let report_type = input.report_type.unwrap_or(self.default_report_type);
        let processed = self.resolve(&input.doc_id, &input.content, report_type)?;

        for diagnostic in &processed.diagnostics {
            match diagnostic.severity() {
                Severity::Warning => warn!(doc_id = %input.doc_id, "{diagnostic}"),
                Severity::Info => debug!(doc_id = %input.doc_id, "{diagnostic}"),
            }
        }
        debug!(
            doc_id = %input.doc_id,
            report_type = %report_type,
            current = processed.record.current_year.is_some(),
            prior = processed.record.prior_year.is_some(),
            diagnostics = processed.diagnostics.len(),
            "Resolved filing"
        );

        Ok(processed)
    }
}
