//! Source trait for retrieving filings.
//!
//! A [`FilingSource`] lists the filings submitted on a day and downloads the
//! archive of one filing. Unpacking archives and resolving their instance
//! documents happen downstream.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::Result, report::ReportType};

/// Form code of an annual securities report.
pub const ANNUAL_REPORT_FORM_CODE: &str = "030000";

/// Returns true if `doc_id` is a usable filing identifier.
///
/// Identifiers name archive files and directories, so anything other than
/// ASCII letters and digits is refused.
#[must_use]
pub fn is_valid_doc_id(doc_id: &str) -> bool {
    !doc_id.is_empty() && doc_id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// One entry of a daily document list.
///
/// Field names follow the EDINET document list API; every field other than
/// the identifier may be null there.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingSummary {
    /// Filing identifier, e.g. `S100W67S`.
    #[serde(rename = "docID")]
    pub doc_id: String,
    /// Filer code.
    #[serde(default)]
    pub edinet_code: Option<String>,
    /// Five-digit security code.
    #[serde(default)]
    pub sec_code: Option<String>,
    /// Filer name.
    #[serde(default)]
    pub filer_name: Option<String>,
    /// Form code, e.g. `030000` for an annual securities report.
    #[serde(default)]
    pub form_code: Option<String>,
    /// Document type code.
    #[serde(default)]
    pub doc_type_code: Option<String>,
    /// End of the reported period.
    #[serde(default)]
    pub period_end: Option<String>,
    /// Submission time, `YYYY-MM-DD hh:mm`.
    #[serde(default)]
    pub submit_date_time: Option<String>,
    /// Document title.
    #[serde(default)]
    pub doc_description: Option<String>,
}

impl FilingSummary {
    /// Returns true if this filing has the given form code.
    #[must_use]
    pub fn has_form_code(&self, code: &str) -> bool {
        self.form_code.as_deref() == Some(code)
    }

    /// Returns true for an annual securities report.
    #[must_use]
    pub fn is_annual_report(&self) -> bool {
        self.has_form_code(ANNUAL_REPORT_FORM_CODE)
    }

    /// Returns the report type implied by the form code, if known.
    #[must_use]
    pub fn report_type(&self) -> Option<ReportType> {
        self.form_code.as_deref().and_then(ReportType::from_form_code)
    }
}

/// Trait for retrieving filings from a disclosure system.
///
/// Implementations are responsible for authentication, rate limiting and
/// retries. Errors are per call; callers decide whether to skip a day or a
/// filing and continue.
#[async_trait]
pub trait FilingSource: Send + Sync {
    /// Returns the name of this source.
    fn name(&self) -> &str;

    /// Lists every filing submitted on `date`.
    async fn list_filings(&self, date: NaiveDate) -> Result<Vec<FilingSummary>>;

    /// Downloads the archive holding a filing's instance documents.
    async fn fetch_archive(&self, doc_id: &str) -> Result<Vec<u8>>;
}
