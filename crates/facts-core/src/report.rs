//! Report type, consolidation basis, and data version identity.
//!
//! This module defines [`ReportType`] for the kind of filing being resolved,
//! [`ConsolidationType`] for the basis its figures are reported on, and
//! [`DataVersion`] for the fiscal period identity a record is exported under.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FactError;

/// Kind of filing. Supplied by the caller, never inferred from facts.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Annual securities report.
    #[default]
    Annual,
    /// Quarterly or semi-annual report.
    Quarterly,
}

impl ReportType {
    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }

    /// Derives the report type from an EDINET form code.
    #[must_use]
    pub fn from_form_code(code: &str) -> Option<Self> {
        match code.trim() {
            "030000" | "030001" => Some(Self::Annual),
            "043000" | "043001" | "043A00" | "043A01" => Some(Self::Quarterly),
            _ => None,
        }
    }

    /// Derives the report type from an instance document file name such as
    /// `jpcrp030000-asr-001_E00001-000_2025-03-31_01_2025-06-25.xbrl`.
    #[must_use]
    pub fn from_instance_name(name: &str) -> Option<Self> {
        name.split(['-', '_', '.'])
            .find_map(|segment| match segment {
                "asr" => Some(Self::Annual),
                "ssr" => Some(Self::Quarterly),
                s if s.len() == 3 && s.starts_with('q') && s.ends_with('r') => {
                    Some(Self::Quarterly)
                }
                _ => None,
            })
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = FactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(Self::Annual),
            "quarterly" => Ok(Self::Quarterly),
            other => Err(FactError::InvalidParameter(format!(
                "report type must be 'annual' or 'quarterly', got '{other}'"
            ))),
        }
    }
}

/// Basis the filing's figures are reported on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationType {
    /// Parent plus subsidiaries.
    #[default]
    Consolidated,
    /// Parent entity alone.
    NonConsolidated,
}

impl ConsolidationType {
    /// Maps the entity's consolidation flag to a basis.
    #[must_use]
    pub const fn from_flag(is_consolidated: bool) -> Self {
        if is_consolidated {
            Self::Consolidated
        } else {
            Self::NonConsolidated
        }
    }

    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Consolidated => "consolidated",
            Self::NonConsolidated => "non_consolidated",
        }
    }
}

impl fmt::Display for ConsolidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fiscal period identity of an exported record, e.g. `2025FY` or `2025Q1`.
///
/// Identifies the period reported on, not when the record was generated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataVersion(String);

impl DataVersion {
    /// Derives the data version from a fiscal year end date (`YYYY-MM-DD`).
    ///
    /// Quarterly reports map the end month 3/6/9/12 to Q1..Q4; any other month
    /// is treated as Q4. Returns `None` if the date does not parse.
    #[must_use]
    pub fn derive(fiscal_year_end: &str, report_type: ReportType) -> Option<Self> {
        let date = NaiveDate::parse_from_str(fiscal_year_end.trim(), "%Y-%m-%d").ok()?;
        let year = date.year();
        let label = match report_type {
            ReportType::Annual => format!("{year}FY"),
            ReportType::Quarterly => {
                let quarter = match date.month() {
                    3 => 1,
                    6 => 2,
                    9 => 3,
                    _ => 4,
                };
                format!("{year}Q{quarter}")
            }
        };
        Some(Self(label))
    }

    /// Wraps an existing label, e.g. one read back from a store.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
