//! JSON dataset file store.
//!
//! Records are written as pretty-printed UTF-8 JSON under
//! `{base}/{report_type}/{data_version}/{security_code}.json`, and a
//! `manifest.json` at the base summarizes what the dataset holds.

use async_trait::async_trait;
use chrono::Utc;
use facts_core::store::ENGINE_VERSION;
use facts_core::{
    DataVersion, ExportedRecord, FactError, RecordKey, RecordStore, ReportType, Result,
    SCHEMA_VERSION, is_valid_security_code,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Environment variable naming the dataset root.
pub const DATASET_PATH_ENV: &str = "DATASET_PATH";

/// File name of the dataset manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

const RECORD_EXTENSION: &str = "json";

/// Summary of a dataset directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Envelope layout version of the records.
    pub schema_version: String,
    /// Engine version that wrote the manifest.
    pub engine_version: String,
    /// Generation time, `%Y-%m-%dT%H:%M:%SZ`.
    pub generated_at: String,
    /// Number of records in the dataset.
    pub total_records: usize,
    /// Record counts per report type and data version.
    pub datasets: BTreeMap<ReportType, BTreeMap<DataVersion, usize>>,
}

impl DatasetManifest {
    /// Builds a manifest from the keys of a dataset.
    #[must_use]
    pub fn from_keys(keys: &[RecordKey]) -> Self {
        let mut datasets: BTreeMap<ReportType, BTreeMap<DataVersion, usize>> = BTreeMap::new();
        for key in keys {
            *datasets
                .entry(key.report_type)
                .or_default()
                .entry(key.data_version.clone())
                .or_default() += 1;
        }
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            total_records: keys.len(),
            datasets,
        }
    }
}

/// File store writing one JSON document per record.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `base`. Directories are created on first write.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Creates a store rooted at `$DATASET_PATH`.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        std::env::var(DATASET_PATH_ENV)
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(Self::new)
            .ok_or_else(|| {
                FactError::InvalidParameter(format!(
                    "{DATASET_PATH_ENV} must be set to the dataset output directory"
                ))
            })
    }

    /// Returns the dataset root.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns the file a record with this key is stored in.
    ///
    /// # Errors
    /// Returns [`FactError::InvalidParameter`] if the security code is not
    /// ASCII alphanumeric, since it would not name a file under the base.
    pub fn path_for(&self, key: &RecordKey) -> Result<PathBuf> {
        if !is_valid_security_code(&key.security_code) {
            return Err(FactError::InvalidParameter(format!(
                "security code {:?} cannot name a record file",
                key.security_code
            )));
        }
        Ok(self
            .base
            .join(key.report_type.as_str())
            .join(key.data_version.as_str())
            .join(format!("{}.{RECORD_EXTENSION}", key.security_code)))
    }

    /// Returns the manifest file path.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.base.join(MANIFEST_FILE)
    }

    /// Rewrites `manifest.json` from the records currently on disk.
    ///
    /// # Errors
    /// Returns an error if the dataset cannot be listed or the manifest written.
    #[instrument(skip(self), fields(base = %self.base.display()))]
    pub async fn write_manifest(&self) -> Result<DatasetManifest> {
        let keys = self.keys().await?;
        let manifest = DatasetManifest::from_keys(&keys);

        tokio::fs::create_dir_all(&self.base).await?;
        let json = serde_json::to_string_pretty(&manifest)?;
        tokio::fs::write(self.manifest_path(), json).await?;

        info!(total_records = manifest.total_records, "Wrote dataset manifest");
        Ok(manifest)
    }

    /// Reads `manifest.json`, if present.
    ///
    /// # Errors
    /// Returns an error if the manifest exists but cannot be read or parsed.
    pub async fn read_manifest(&self) -> Result<Option<DatasetManifest>> {
        match tokio::fs::read_to_string(self.manifest_path()).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Lists `(name, path)` of the subdirectories of `dir`; a missing directory is empty.
async fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir()
            && let Some(name) = entry.file_name().to_str()
        {
            dirs.push((name.to_string(), entry.path()));
        }
    }
    Ok(dirs)
}

#[async_trait]
impl RecordStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    #[instrument(skip(self, record), fields(key = %record.key(), doc_id = %record.doc_id))]
    async fn put(&self, record: &ExportedRecord) -> Result<String> {
        let path = self.path_for(&record.key())?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, json).await?;

        debug!(path = %path.display(), "Wrote record");
        Ok(path.display().to_string())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &RecordKey) -> Result<Option<ExportedRecord>> {
        match tokio::fs::read_to_string(self.path_for(key)?).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Record not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<RecordKey>> {
        let mut keys = Vec::new();

        for (report_dir, report_path) in subdirectories(&self.base).await? {
            let Ok(report_type) = report_dir.parse::<ReportType>() else {
                debug!(dir = %report_dir, "Skipping unrecognized directory");
                continue;
            };

            for (version, version_path) in subdirectories(&report_path).await? {
                let mut entries = tokio::fs::read_dir(&version_path).await?;
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                        continue;
                    }
                    match path.file_stem().and_then(|s| s.to_str()) {
                        Some(code) => keys.push(RecordKey {
                            report_type,
                            data_version: DataVersion::new(version.clone()),
                            security_code: code.to_string(),
                        }),
                        None => warn!(path = %path.display(), "Skipping non-UTF-8 file name"),
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    #[instrument(skip(self), fields(base = %self.base.display()))]
    async fn clear(&self) -> Result<()> {
        for report_type in [ReportType::Annual, ReportType::Quarterly] {
            let dir = self.base.join(report_type.as_str());
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => debug!(dir = %dir.display(), "Removed dataset directory"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        match tokio::fs::remove_file(self.manifest_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
