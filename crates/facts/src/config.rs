//! Pipeline and retrieval configuration.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use facts_core::{FactError, ReportType, Result};
use facts_edinet::{API_KEY_ENV, EdinetClient, validate_api_key};

/// Environment variable naming the dataset root.
pub const DATASET_PATH_ENV: &str = facts_store::DATASET_PATH_ENV;
/// Environment variable bounding concurrent filings.
pub const CONCURRENCY_ENV: &str = "FACTS_CONCURRENCY";
/// Environment variable naming the report type for filings that carry none.
pub const REPORT_TYPE_ENV: &str = "FACTS_REPORT_TYPE";

/// Environment variable naming the download root.
pub const DATA_DIR_ENV: &str = "FACTS_DATA_DIR";
/// Environment variable spacing EDINET requests, in milliseconds.
pub const REQUEST_INTERVAL_ENV: &str = "FACTS_REQUEST_INTERVAL_MS";

const DEFAULT_DATA_DIR: &str = "data/edinet";
const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(200);

/// Settings for a [`FilingPipeline`](crate::FilingPipeline).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Root of the JSON dataset; no export when absent.
    pub dataset_path: Option<PathBuf>,
    /// Maximum number of filings resolved at once.
    pub concurrency: usize,
    /// Report type for filings whose type is not known.
    pub default_report_type: Option<ReportType>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            concurrency: std::thread::available_parallelism().map_or(4, NonZeroUsize::get),
            default_report_type: None,
        }
    }
}

impl PipelineConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if a variable is set to an
    /// invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Unset and blank variables keep their defaults.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if a variable is set to an
    /// invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(DATASET_PATH_ENV) {
            config.dataset_path = Some(PathBuf::from(path));
        }
        if let Some(concurrency) = get(CONCURRENCY_ENV) {
            let parsed = concurrency
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|e| {
                    FactError::InvalidParameter(format!(
                        "{CONCURRENCY_ENV} must be a positive integer, got '{concurrency}': {e}"
                    ))
                })?;
            config.concurrency = parsed.get();
        }
        if let Some(report_type) = get(REPORT_TYPE_ENV) {
            config.default_report_type = Some(report_type.parse()?);
        }

        Ok(config)
    }

    /// Sets the dataset root.
    #[must_use]
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = Some(path.into());
        self
    }

    /// Sets the concurrency, at least 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the report type for filings whose type is not known.
    #[must_use]
    pub const fn with_default_report_type(mut self, report_type: ReportType) -> Self {
        self.default_report_type = Some(report_type);
        self
    }
}

/// Settings for a [`FilingFetcher`](crate::FilingFetcher).
#[derive(Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Root holding `raw_zip/` and `raw_xbrl/`.
    pub data_dir: PathBuf,
    /// EDINET subscription key.
    pub api_key: Option<String>,
    /// Minimum spacing between requests.
    pub request_interval: Duration,
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("data_dir", &self.data_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("request_interval", &self.request_interval)
            .finish()
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            api_key: None,
            request_interval: DEFAULT_REQUEST_INTERVAL,
        }
    }
}

impl FetchConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if a variable is set to an
    /// invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if a variable is set to an
    /// invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = get(API_KEY_ENV) {
            config.api_key = Some(key.trim().to_string());
        }
        if let Some(interval) = get(REQUEST_INTERVAL_ENV) {
            let millis = interval.trim().parse::<u64>().map_err(|e| {
                FactError::InvalidParameter(format!(
                    "{REQUEST_INTERVAL_ENV} must be a number of milliseconds, got '{interval}': {e}"
                ))
            })?;
            config.request_interval = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Sets the download root.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the subscription key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the minimum spacing between requests.
    #[must_use]
    pub const fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Directory of downloaded archives.
    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("raw_zip")
    }

    /// Directory of unpacked instance documents.
    #[must_use]
    pub fn instance_dir(&self) -> PathBuf {
        self.data_dir.join("raw_xbrl")
    }

    /// Builds an EDINET client.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if no usable subscription key
    /// is configured.
    pub fn client(&self) -> Result<EdinetClient> {
        let key = validate_api_key(self.api_key.as_deref().unwrap_or_default())?;
        Ok(EdinetClient::new(key).with_request_interval(self.request_interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.dataset_path, None);
        assert!(config.concurrency >= 1);
        assert_eq!(config.default_report_type, None);
    }

    #[test]
    fn test_from_lookup() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("DATASET_PATH", "/data/financial"),
            ("FACTS_CONCURRENCY", " 8 "),
            ("FACTS_REPORT_TYPE", "Quarterly"),
        ]))
        .unwrap();

        assert_eq!(config.dataset_path, Some(PathBuf::from("/data/financial")));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.default_report_type, Some(ReportType::Quarterly));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[("DATASET_PATH", "  ")])).unwrap();
        assert_eq!(config.dataset_path, None);
    }

    #[test]
    fn test_invalid_values() {
        let err = PipelineConfig::from_lookup(lookup(&[("FACTS_CONCURRENCY", "0")])).unwrap_err();
        assert!(matches!(err, FactError::InvalidParameter(_)));

        let err = PipelineConfig::from_lookup(lookup(&[("FACTS_REPORT_TYPE", "monthly")])).unwrap_err();
        assert!(matches!(err, FactError::InvalidParameter(_)));
    }

    #[test]
    fn test_builders() {
        let config = PipelineConfig::default()
            .with_dataset_path("out")
            .with_concurrency(0)
            .with_default_report_type(ReportType::Annual);
        assert_eq!(config.dataset_path, Some(PathBuf::from("out")));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.default_report_type, Some(ReportType::Annual));
    }

    #[test]
    fn test_fetch_defaults() {
        let config = FetchConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data/edinet"));
        assert_eq!(config.archive_dir(), PathBuf::from("data/edinet/raw_zip"));
        assert_eq!(config.instance_dir(), PathBuf::from("data/edinet/raw_xbrl"));
        assert_eq!(config.api_key, None);
        assert_eq!(config.request_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_fetch_from_lookup() {
        let config = FetchConfig::from_lookup(lookup(&[
            ("FACTS_DATA_DIR", "/srv/edinet"),
            ("EDINET_API_KEY", " abc123 "),
            ("FACTS_REQUEST_INTERVAL_MS", "500"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/edinet"));
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.request_interval, Duration::from_millis(500));

        let err = FetchConfig::from_lookup(lookup(&[("FACTS_REQUEST_INTERVAL_MS", "fast")]))
            .unwrap_err();
        assert!(matches!(err, FactError::InvalidParameter(_)));
    }

    #[test]
    fn test_client_requires_key() {
        let missing = FetchConfig::default();
        assert!(matches!(missing.client(), Err(FactError::InvalidParameter(_))));

        let placeholder = FetchConfig::default().with_api_key("YOUR_API_KEY");
        assert!(matches!(placeholder.client(), Err(FactError::InvalidParameter(_))));

        assert!(FetchConfig::default().with_api_key("abc123").client().is_ok());
    }

    #[test]
    fn test_fetch_debug_redacts_api_key() {
        let config = FetchConfig::default().with_api_key("secret_key_12345");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
