//! Error types for filing resolution and export.
//!
//! This module defines [`FactError`] which covers the failures that can occur
//! when retrieving a filing, parsing it, resolving its facts, or handing the
//! resulting record to an export collaborator.
//!
//! Missing or unparsable individual facts are never errors; they surface as
//! nulls in the record and as [`Diagnostic`](crate::Diagnostic) values.

use thiserror::Error;

/// Errors that can occur during filing operations.
#[derive(Error, Debug)]
pub enum FactError {
    /// The document is not well-formed markup, so no document root exists.
    #[error("XML error in {doc_id}: {message}")]
    Xml {
        /// The filing identifier.
        doc_id: String,
        /// Parser message.
        message: String,
    },

    /// The document parsed but lacks the structure every filing must have.
    #[error("Structurally absent input in {doc_id}: {reason}")]
    StructurallyAbsent {
        /// The filing identifier.
        doc_id: String,
        /// What was missing.
        reason: String,
    },

    /// Network-related errors (connection failures, timeouts, HTTP errors).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a filing source.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The source that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// A downloaded filing archive could not be unpacked.
    #[error("Archive error in {doc_id}: {message}")]
    Archive {
        /// The filing identifier.
        doc_id: String,
        /// What went wrong.
        message: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The export collaborator rejected a record.
    #[error("Export rejected for {doc_id}: {reason}")]
    Export {
        /// The filing identifier.
        doc_id: String,
        /// Why the record was rejected.
        reason: String,
    },

    /// Error interacting with a record store.
    #[error("Store error: {0}")]
    Store(String),

    /// Error serializing or deserializing a record.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error building a DataFrame from records.
    #[error("Frame error: {0}")]
    Frame(String),

    /// I/O error reading a filing or writing an export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl FactError {
    /// Returns true if the error means the filing itself could not be resolved.
    ///
    /// Batch processing skips such filings and continues with the next one.
    #[must_use]
    pub const fn is_fatal_for_filing(&self) -> bool {
        matches!(self, Self::Xml { .. } | Self::StructurallyAbsent { .. })
    }
}

impl From<serde_json::Error> for FactError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Result type alias using [`FactError`].
pub type Result<T> = std::result::Result<T, FactError>;
