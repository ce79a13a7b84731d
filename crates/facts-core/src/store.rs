//! Store trait for persisting canonical records.
//!
//! This module defines the [`RecordStore`] trait implemented by export
//! collaborators, and the [`ExportedRecord`] envelope they persist. The
//! envelope owns schema versioning; the canonical record itself carries none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    error::{FactError, Result},
    record::{CanonicalRecord, YearBlock, normalize_accounting_standard},
    report::{ConsolidationType, DataVersion, ReportType},
};

/// Version of the exported envelope layout.
pub const SCHEMA_VERSION: &str = "3.0";

/// Version of the engine that produced a record.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reporting currency and unit of every exported record.
pub const REPORTING_CURRENCY: &str = "JPY";

/// Returns true if `code` can name a record: non-empty ASCII letters and digits.
///
/// Stores use the security code as a path or key component, so nothing else
/// is accepted.
#[must_use]
pub fn is_valid_security_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Identity of an exported record within a store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// Kind of filing.
    pub report_type: ReportType,
    /// Fiscal period identity.
    pub data_version: DataVersion,
    /// Normalized security code.
    pub security_code: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.report_type, self.data_version, self.security_code
        )
    }
}

/// A canonical record wrapped for export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportedRecord {
    /// Envelope layout version.
    pub schema_version: String,
    /// Engine version.
    pub engine_version: String,
    /// Fiscal period identity.
    pub data_version: DataVersion,
    /// Generation time, `%Y-%m-%dT%H:%M:%SZ`.
    pub generated_at: String,
    /// Filing identifier.
    pub doc_id: String,
    /// Normalized security code.
    pub security_code: String,
    /// Kind of filing.
    pub report_type: ReportType,
    /// Reporting basis.
    pub consolidation_type: ConsolidationType,
    /// Normalized accounting standard.
    pub accounting_standard: Option<String>,
    /// Reporting currency.
    pub currency: String,
    /// Reporting unit.
    pub unit: String,
    /// Current year block.
    pub current_year: YearBlock,
    /// Prior year block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_year: Option<YearBlock>,
}

impl ExportedRecord {
    /// Wraps a canonical record, validating that it can be exported.
    ///
    /// # Errors
    /// Returns [`FactError::Export`] if the record has no usable security code,
    /// no parsable fiscal year end, or no current year block.
    pub fn from_record(record: &CanonicalRecord, generated_at: DateTime<Utc>) -> Result<Self> {
        let reject = |reason: &str| FactError::Export {
            doc_id: record.doc_id.clone(),
            reason: reason.to_string(),
        };

        let security_code = record
            .security_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| reject("security code not disclosed"))?;
        if !is_valid_security_code(security_code) {
            return Err(reject("security code is not ASCII alphanumeric"));
        }

        let data_version = record
            .fiscal_year_end
            .as_deref()
            .and_then(|end| DataVersion::derive(end, record.report_type))
            .ok_or_else(|| reject("fiscal year end missing or unparsable"))?;

        let current_year = record
            .current_year
            .clone()
            .ok_or_else(|| reject("no current year facts"))?;

        Ok(Self {
            schema_version: SCHEMA_VERSION.to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            data_version,
            generated_at: generated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            doc_id: record.doc_id.clone(),
            security_code: security_code.to_string(),
            report_type: record.report_type,
            consolidation_type: record.consolidation_type,
            accounting_standard: normalize_accounting_standard(
                record.accounting_standard.as_deref(),
            ),
            currency: REPORTING_CURRENCY.to_string(),
            unit: REPORTING_CURRENCY.to_string(),
            current_year,
            prior_year: record.prior_year.clone(),
        })
    }

    /// Returns the store identity of this record.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey {
            report_type: self.report_type,
            data_version: self.data_version.clone(),
            security_code: self.security_code.clone(),
        }
    }
}

/// Trait for persisting exported records.
///
/// Implementations can store records in various backends (JSON dataset
/// directories, SQLite, in-memory, etc.). A put replaces any record with the
/// same [`RecordKey`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the name of this store.
    fn name(&self) -> &str;

    /// Stores a record, returning where it was written.
    async fn put(&self, record: &ExportedRecord) -> Result<String>;

    /// Retrieves a stored record.
    ///
    /// Returns `Ok(Some(record))` if stored, `Ok(None)` if not.
    async fn get(&self, key: &RecordKey) -> Result<Option<ExportedRecord>>;

    /// Lists the keys of all stored records, sorted.
    async fn keys(&self) -> Result<Vec<RecordKey>>;

    /// Removes all stored records.
    async fn clear(&self) -> Result<()>;
}
