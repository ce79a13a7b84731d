//! Resolved values and the canonical per-filing record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::keys::{CanonicalKey, Metric, Statement};
use crate::report::{ConsolidationType, ReportType};
use crate::types::PeriodRange;

/// A parsed numeric fact value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    /// Whole-unit amount or count.
    Integer(i64),
    /// Per-share or ratio-like value.
    Decimal(f64),
}

impl FactValue {
    /// Returns the value as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> f64 {
        match *self {
            Self::Integer(v) => v as f64,
            Self::Decimal(v) => v,
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
        }
    }
}

/// Canonical key to value, null when undisclosed or unparsable.
pub type KeyValues = BTreeMap<CanonicalKey, Option<FactValue>>;

/// Matched, consolidation-resolved facts for one period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct YearBucket {
    /// Profit and loss.
    pub pl: KeyValues,
    /// Balance sheet.
    pub bs: KeyValues,
    /// Cash flow.
    pub cf: KeyValues,
    /// Dividends.
    pub dividend: KeyValues,
    /// Flow period of the year, when a matching duration has a start date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodRange>,
}

impl YearBucket {
    /// Returns the map for a statement group.
    #[must_use]
    pub const fn statement(&self, statement: Statement) -> &KeyValues {
        match statement {
            Statement::Pl => &self.pl,
            Statement::Bs => &self.bs,
            Statement::Cf => &self.cf,
            Statement::Dividend => &self.dividend,
        }
    }

    /// Returns a mutable map for a statement group.
    pub fn statement_mut(&mut self, statement: Statement) -> &mut KeyValues {
        match statement {
            Statement::Pl => &mut self.pl,
            Statement::Bs => &mut self.bs,
            Statement::Cf => &mut self.cf,
            Statement::Dividend => &mut self.dividend,
        }
    }

    /// Returns the resolved value for a key, looking in the key's statement group.
    #[must_use]
    pub fn value(&self, key: CanonicalKey) -> Option<FactValue> {
        self.statement(key.statement()).get(&key).copied().flatten()
    }
}

/// Metric to value, null when undisclosed.
pub type Metrics = BTreeMap<Metric, Option<FactValue>>;

/// A year block of the canonical record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YearBlock {
    /// Every metric, null when undisclosed.
    pub metrics: Metrics,
    /// Flow period of the year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodRange>,
}

impl YearBlock {
    /// Returns the value of a metric.
    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<FactValue> {
        self.metrics.get(&metric).copied().flatten()
    }

    /// Returns the number of non-null metrics.
    #[must_use]
    pub fn disclosed_count(&self) -> usize {
        self.metrics.values().filter(|v| v.is_some()).count()
    }
}

/// Entity-level descriptors of a filing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Filing identifier, supplied by the caller.
    pub doc_id: String,
    /// Security code as disclosed.
    pub security_code: Option<String>,
    /// Filer name.
    pub company_name: Option<String>,
    /// Accounting standard as disclosed.
    pub accounting_standard: Option<String>,
    /// Whether consolidated statements are prepared. True when undisclosed.
    pub is_consolidated: bool,
    /// Fiscal year end date as disclosed.
    pub fiscal_year_end: Option<String>,
    /// Kind of filing.
    pub report_type: ReportType,
}

impl EntityMetadata {
    /// Creates metadata with nothing disclosed.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, report_type: ReportType) -> Self {
        Self {
            doc_id: doc_id.into(),
            security_code: None,
            company_name: None,
            accounting_standard: None,
            is_consolidated: true,
            fiscal_year_end: None,
            report_type,
        }
    }
}

/// Canonical per-filing record.
///
/// A year block is present only if at least one of its metrics is non-null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Filing identifier.
    pub doc_id: String,
    /// Normalized security code.
    pub security_code: Option<String>,
    /// Filer name.
    pub company_name: Option<String>,
    /// Accounting standard as disclosed.
    pub accounting_standard: Option<String>,
    /// Whether consolidated statements are prepared.
    pub is_consolidated: bool,
    /// Reporting basis derived from `is_consolidated`.
    pub consolidation_type: ConsolidationType,
    /// Fiscal year end date as disclosed.
    pub fiscal_year_end: Option<String>,
    /// Kind of filing.
    pub report_type: ReportType,
    /// Current year block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_year: Option<YearBlock>,
    /// Prior year block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_year: Option<YearBlock>,
}

impl CanonicalRecord {
    /// Returns true if neither year block is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current_year.is_none() && self.prior_year.is_none()
    }
}

/// Normalizes a disclosed security code.
///
/// A five-character code ending in `0` drops its trailing check digit; any
/// other code passes through trimmed.
#[must_use]
pub fn normalize_security_code(raw: &str) -> String {
    let code = raw.trim();
    if code.chars().count() == 5 && code.ends_with('0') {
        code[..code.len() - 1].to_string()
    } else {
        code.to_string()
    }
}

/// Normalizes the spelling variants of an accounting standard.
///
/// Unknown spellings pass through trimmed; empty input yields `None`.
#[must_use]
pub fn normalize_accounting_standard(raw: Option<&str>) -> Option<String> {
    let standard = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let normalized = match standard {
        "Japan GAAP" | "日本基準" | "JGAAP" => "JGAAP",
        "IFRS" => "IFRS",
        "US GAAP" | "US-GAAP" => "US-GAAP",
        other => other,
    };
    Some(normalized.to_string())
}
