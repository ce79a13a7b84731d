//! Retrieval of filings into the local layout.
//!
//! Archives land in `raw_zip/{year}/{doc_id}.zip` and their instance
//! documents in `raw_xbrl/{year}/{doc_id}/`, where `year` is the year of the
//! list date. Both steps are idempotent: an existing archive is not
//! downloaded again and an already unpacked filing is not unpacked again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, TimeDelta, Utc};
use tracing::{debug, info, instrument, warn};

use facts_core::{
    ANNUAL_REPORT_FORM_CODE, FactError, FilingSource, Result, is_valid_doc_id,
};
use facts_edinet::extract_instances;

use crate::config::FetchConfig;

/// Today's date in Japan Standard Time, the calendar EDINET lists by.
#[must_use]
pub fn today_jst() -> NaiveDate {
    (Utc::now() + TimeDelta::hours(9)).date_naive()
}

/// Outcome of retrieving one filing.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The archive was downloaded and unpacked.
    Downloaded {
        /// Filing identifier.
        doc_id: String,
        /// Downloaded archive.
        archive: PathBuf,
        /// Unpacked instance documents.
        instances: Vec<PathBuf>,
    },
    /// The archive was already on disk.
    Skipped {
        /// Filing identifier.
        doc_id: String,
        /// Existing archive.
        archive: PathBuf,
        /// Unpacked instance documents.
        instances: Vec<PathBuf>,
    },
    /// The filing could not be downloaded or unpacked.
    Failed {
        /// Filing identifier.
        doc_id: String,
        /// Why it failed.
        error: FactError,
    },
}

impl FetchOutcome {
    /// Returns the filing identifier.
    #[must_use]
    pub fn doc_id(&self) -> &str {
        match self {
            Self::Downloaded { doc_id, .. }
            | Self::Skipped { doc_id, .. }
            | Self::Failed { doc_id, .. } => doc_id,
        }
    }

    /// Returns the unpacked instance documents, none for a failure.
    #[must_use]
    pub fn instances(&self) -> &[PathBuf] {
        match self {
            Self::Downloaded { instances, .. } | Self::Skipped { instances, .. } => instances,
            Self::Failed { .. } => &[],
        }
    }

    /// Returns true for [`FetchOutcome::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcomes of a date range.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// One outcome per selected filing, in list order.
    pub outcomes: Vec<FetchOutcome>,
    /// Days whose document list could not be retrieved.
    pub failed_dates: Vec<(NaiveDate, FactError)>,
}

impl FetchReport {
    /// Number of archives downloaded.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FetchOutcome::Downloaded { .. }))
            .count()
    }

    /// Number of archives already on disk.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FetchOutcome::Skipped { .. }))
            .count()
    }

    /// Number of filings that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Every unpacked instance document, in outcome order.
    #[must_use]
    pub fn instances(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .flat_map(|o| o.instances().iter().cloned())
            .collect()
    }
}

/// Downloads filings from a [`FilingSource`] and unpacks their instance documents.
///
/// Filings are retrieved one at a time; the source spaces its own requests.
/// A failing filing or day never aborts a range.
///
/// # Example
///
/// ```rust,ignore
/// use facts::{FetchConfig, FilingFetcher, FilingPipeline, today_jst};
///
/// let fetcher = FilingFetcher::from_config(&FetchConfig::from_env()?)?;
/// let fetched = fetcher.fetch_range(today_jst(), today_jst()).await?;
/// let report = FilingPipeline::edinet().process_paths(&fetched.instances()).await;
/// ```
pub struct FilingFetcher {
    source: Arc<dyn FilingSource>,
    archive_dir: PathBuf,
    instance_dir: PathBuf,
    form_codes: Vec<String>,
}

impl std::fmt::Debug for FilingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilingFetcher")
            .field("source", &self.source.name())
            .field("archive_dir", &self.archive_dir)
            .field("instance_dir", &self.instance_dir)
            .field("form_codes", &self.form_codes)
            .finish()
    }
}

impl FilingFetcher {
    /// Create a fetcher storing under `data_dir`, selecting annual reports.
    #[must_use]
    pub fn new(source: Arc<dyn FilingSource>, data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            source,
            archive_dir: data_dir.join("raw_zip"),
            instance_dir: data_dir.join("raw_xbrl"),
            form_codes: vec![ANNUAL_REPORT_FORM_CODE.to_string()],
        }
    }

    /// Create a fetcher backed by the EDINET API.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if no usable subscription key
    /// is configured.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(config.client()?), &config.data_dir))
    }

    /// Set the form codes of the filings to retrieve.
    #[must_use]
    pub fn with_form_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.form_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Path of a filing's archive.
    #[must_use]
    pub fn archive_path(&self, year: i32, doc_id: &str) -> PathBuf {
        self.archive_dir
            .join(year.to_string())
            .join(format!("{doc_id}.zip"))
    }

    /// Directory of a filing's instance documents.
    #[must_use]
    pub fn instance_path(&self, year: i32, doc_id: &str) -> PathBuf {
        self.instance_dir.join(year.to_string()).join(doc_id)
    }

    /// Retrieves the selected filings submitted on `date`.
    ///
    /// # Errors
    /// Returns an error if the document list cannot be retrieved. Failures of
    /// single filings are reported as [`FetchOutcome::Failed`].
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn fetch_date(&self, date: NaiveDate) -> Result<Vec<FetchOutcome>> {
        let filings = self.source.list_filings(date).await?;
        let listed = filings.len();
        let selected: Vec<_> = filings
            .into_iter()
            .filter(|filing| self.form_codes.iter().any(|code| filing.has_form_code(code)))
            .collect();
        info!(%date, listed, selected = selected.len(), "Listed filings");

        let mut outcomes = Vec::with_capacity(selected.len());
        for filing in &selected {
            outcomes.push(self.fetch_filing(date.year(), &filing.doc_id).await);
        }
        Ok(outcomes)
    }

    /// Downloads one filing unless its archive exists, then unpacks it.
    pub async fn fetch_filing(&self, year: i32, doc_id: &str) -> FetchOutcome {
        if !is_valid_doc_id(doc_id) {
            warn!(doc_id, "Refusing filing with an invalid identifier");
            return FetchOutcome::Failed {
                doc_id: doc_id.to_string(),
                error: FactError::InvalidParameter(format!("invalid document id: {doc_id:?}")),
            };
        }

        let archive = self.archive_path(year, doc_id);
        let exists = tokio::fs::try_exists(&archive).await.unwrap_or(false);
        if exists {
            debug!(doc_id, archive = %archive.display(), "Archive already downloaded");
        } else if let Err(error) = self.download(doc_id, &archive).await {
            warn!(doc_id, error = %error, "Download failed");
            return FetchOutcome::Failed {
                doc_id: doc_id.to_string(),
                error,
            };
        }

        let dest = self.instance_path(year, doc_id);
        let instances = match unpack(archive.clone(), doc_id.to_string(), dest).await {
            Ok(instances) => instances,
            Err(error) => {
                warn!(doc_id, error = %error, "Extraction failed");
                return FetchOutcome::Failed {
                    doc_id: doc_id.to_string(),
                    error,
                };
            }
        };

        let doc_id = doc_id.to_string();
        if exists {
            FetchOutcome::Skipped {
                doc_id,
                archive,
                instances,
            }
        } else {
            FetchOutcome::Downloaded {
                doc_id,
                archive,
                instances,
            }
        }
    }

    /// Writes the archive through a partial file so that an interrupted
    /// download is never mistaken for a complete one.
    async fn download(&self, doc_id: &str, archive: &Path) -> Result<()> {
        let bytes = self.source.fetch_archive(doc_id).await?;
        if let Some(parent) = archive.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = archive.with_extension("zip.part");
        let written = match tokio::fs::write(&partial, &bytes).await {
            Ok(()) => tokio::fs::rename(&partial, archive).await,
            Err(error) => Err(error),
        };
        if let Err(error) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(error.into());
        }
        debug!(doc_id, bytes = bytes.len(), archive = %archive.display(), "Saved archive");
        Ok(())
    }

    /// Retrieves the selected filings for every day from `start` to `end` inclusive.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if `start` is after `end`. A day
    /// whose list fails is recorded in [`FetchReport::failed_dates`].
    pub async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> Result<FetchReport> {
        if start > end {
            return Err(FactError::InvalidParameter(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let mut report = FetchReport::default();
        for date in start.iter_days().take_while(|date| *date <= end) {
            match self.fetch_date(date).await {
                Ok(outcomes) => report.outcomes.extend(outcomes),
                Err(error) => {
                    warn!(%date, error = %error, "Could not list filings");
                    report.failed_dates.push((date, error));
                }
            }
        }

        info!(
            %start,
            %end,
            downloaded = report.downloaded(),
            skipped = report.skipped(),
            failed = report.failed(),
            failed_dates = report.failed_dates.len(),
            "Fetch complete"
        );
        Ok(report)
    }
}

async fn unpack(archive: PathBuf, doc_id: String, dest: PathBuf) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || extract_instances(&archive, &doc_id, &dest))
        .await
        .map_err(|e| FactError::Other(format!("extraction worker failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilingPipeline;
    use async_trait::async_trait;
    use facts_core::FilingSummary;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const INSTANCE_NAME: &str = "jpcrp030000-asr-001_E05325-000_2025-03-31_01_2025-06-25.xbrl";

    const INSTANCE: &str = r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
    xmlns:jppfs_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jppfs/2024-11-01/jppfs_cor"
    xmlns:jpdei_cor="http://disclosure.edinet-fsa.go.jp/taxonomy/jpdei/2013-08-31/jpdei_cor">
  <xbrli:context id="CurrentYearDuration"><xbrli:period><xbrli:startDate>2024-04-01</xbrli:startDate><xbrli:endDate>2025-03-31</xbrli:endDate></xbrli:period></xbrli:context>
  <xbrli:context id="CurrentYearInstant"><xbrli:period><xbrli:instant>2025-03-31</xbrli:instant></xbrli:period></xbrli:context>
  <jpdei_cor:SecurityCodeDEI contextRef="CurrentYearInstant">39230</jpdei_cor:SecurityCodeDEI>
  <jppfs_cor:NetSales contextRef="CurrentYearDuration">1000</jppfs_cor:NetSales>
</xbrli:xbrl>"#;

    /// In-memory source with scripted lists and archives.
    #[derive(Debug, Default)]
    struct FixtureSource {
        lists: HashMap<NaiveDate, Vec<FilingSummary>>,
        failing_dates: Vec<NaiveDate>,
        archives: HashMap<String, Vec<u8>>,
        fetched: Mutex<Vec<String>>,
    }

    impl FixtureSource {
        fn with_filing(mut self, date: NaiveDate, doc_id: &str, form_code: &str) -> Self {
            self.lists.entry(date).or_default().push(FilingSummary {
                doc_id: doc_id.to_string(),
                form_code: Some(form_code.to_string()),
                ..FilingSummary::default()
            });
            self
        }

        fn with_archive(mut self, doc_id: &str, bytes: Vec<u8>) -> Self {
            self.archives.insert(doc_id.to_string(), bytes);
            self
        }

        fn with_failing_date(mut self, date: NaiveDate) -> Self {
            self.failing_dates.push(date);
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FilingSource for FixtureSource {
        fn name(&self) -> &str {
            "fixture"
        }

        async fn list_filings(&self, date: NaiveDate) -> Result<Vec<FilingSummary>> {
            if self.failing_dates.contains(&date) {
                return Err(FactError::Network("HTTP 503 Service Unavailable".to_string()));
            }
            Ok(self.lists.get(&date).cloned().unwrap_or_default())
        }

        async fn fetch_archive(&self, doc_id: &str) -> Result<Vec<u8>> {
            self.fetched.lock().unwrap().push(doc_id.to_string());
            self.archives
                .get(doc_id)
                .cloned()
                .ok_or_else(|| FactError::Network(format!("HTTP 404 Not Found: {doc_id}")))
        }
    }

    fn filing_zip() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                format!("XBRL/PublicDoc/{INSTANCE_NAME}"),
                SimpleFileOptions::default(),
            )
            .unwrap();
        writer.write_all(INSTANCE.as_bytes()).unwrap();
        writer
            .start_file("XBRL/AuditDoc/jpaud-aar-cn-001.xbrl", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<audit/>").unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_date_selects_annual_reports() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(
            FixtureSource::default()
                .with_filing(date(25), "S100W67S", "030000")
                .with_filing(date(25), "S100W68T", "053000")
                .with_archive("S100W67S", filing_zip()),
        );
        let fetcher = FilingFetcher::new(source.clone(), dir.path());

        let outcomes = fetcher.fetch_date(date(25)).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(source.fetched(), vec!["S100W67S"]);
        match &outcomes[0] {
            FetchOutcome::Downloaded {
                doc_id,
                archive,
                instances,
            } => {
                assert_eq!(doc_id, "S100W67S");
                assert_eq!(archive, &dir.path().join("raw_zip/2025/S100W67S.zip"));
                assert!(archive.exists());
                assert_eq!(
                    instances,
                    &vec![dir.path().join("raw_xbrl/2025/S100W67S").join(INSTANCE_NAME)]
                );
            }
            other => panic!("expected download, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetched_instances_resolve() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(
            FixtureSource::default()
                .with_filing(date(25), "S100W67S", "030000")
                .with_archive("S100W67S", filing_zip()),
        );
        let fetcher = FilingFetcher::new(source, dir.path());

        let fetched = fetcher.fetch_range(date(25), date(25)).await.unwrap();
        let report = FilingPipeline::edinet()
            .process_paths(&fetched.instances())
            .await;

        assert_eq!(report.len(), 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outcomes[0].doc_id(), "S100W67S");
    }

    #[tokio::test]
    async fn test_existing_archive_is_not_downloaded_again() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(
            FixtureSource::default()
                .with_filing(date(25), "S100W67S", "030000")
                .with_archive("S100W67S", filing_zip()),
        );
        let fetcher = FilingFetcher::new(source.clone(), dir.path());

        fetcher.fetch_date(date(25)).await.unwrap();
        let second = fetcher.fetch_date(date(25)).await.unwrap();

        assert_eq!(source.fetched().len(), 1);
        assert!(matches!(&second[0], FetchOutcome::Skipped { instances, .. } if instances.len() == 1));
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_archive() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FixtureSource::default().with_filing(date(25), "S100W67S", "030000"));
        let fetcher = FilingFetcher::new(source, dir.path());

        let outcomes = fetcher.fetch_date(date(25)).await.unwrap();

        assert!(matches!(&outcomes[0], FetchOutcome::Failed { error: FactError::Network(_), .. }));
        let archive = fetcher.archive_path(2025, "S100W67S");
        assert!(!archive.exists());
        assert!(!archive.with_extension("zip.part").exists());
    }

    #[tokio::test]
    async fn test_corrupt_archive_is_kept_and_reported() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(
            FixtureSource::default()
                .with_filing(date(25), "S100W67S", "030000")
                .with_archive("S100W67S", b"not a zip".to_vec()),
        );
        let fetcher = FilingFetcher::new(source, dir.path());

        let outcomes = fetcher.fetch_date(date(25)).await.unwrap();

        assert!(matches!(&outcomes[0], FetchOutcome::Failed { error: FactError::Archive { .. }, .. }));
        assert!(fetcher.archive_path(2025, "S100W67S").exists());
        assert!(outcomes[0].instances().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_doc_id_is_not_requested() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FixtureSource::default().with_filing(date(25), "../S100", "030000"));
        let fetcher = FilingFetcher::new(source.clone(), dir.path());

        let outcomes = fetcher.fetch_date(date(25)).await.unwrap();

        assert!(matches!(&outcomes[0], FetchOutcome::Failed { error: FactError::InvalidParameter(_), .. }));
        assert!(source.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_range_continues_past_failed_day() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(
            FixtureSource::default()
                .with_failing_date(date(24))
                .with_filing(date(26), "S100W67S", "030000")
                .with_archive("S100W67S", filing_zip()),
        );
        let fetcher = FilingFetcher::new(source, dir.path());

        let report = fetcher.fetch_range(date(24), date(26)).await.unwrap();

        assert_eq!(report.failed_dates.len(), 1);
        assert_eq!(report.failed_dates[0].0, date(24));
        assert_eq!(report.downloaded(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.instances().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_range_rejects_reversed_dates() {
        let dir = TempDir::new().unwrap();
        let fetcher = FilingFetcher::new(Arc::new(FixtureSource::default()), dir.path());

        let err = fetcher.fetch_range(date(26), date(24)).await.unwrap_err();
        assert!(matches!(err, FactError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_custom_form_codes() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(
            FixtureSource::default()
                .with_filing(date(25), "S100W67S", "030000")
                .with_filing(date(25), "S100AMND", "030001")
                .with_archive("S100AMND", filing_zip()),
        );
        let fetcher = FilingFetcher::new(source.clone(), dir.path()).with_form_codes(["030001"]);

        let outcomes = fetcher.fetch_date(date(25)).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].doc_id(), "S100AMND");
    }

    #[test]
    fn test_today_jst_is_near_utc_date() {
        let utc = Utc::now().date_naive();
        let jst = today_jst();
        assert!(jst == utc || jst == utc.succ_opt().unwrap());
    }
}
