//! Filing archive extraction.
//!
//! An EDINET archive holds the instance document under `XBRL/PublicDoc/`
//! next to audit reports, schemas and linkbases. Only the instance
//! documents are unpacked, flattened into one directory per filing so that
//! [`FilingInput::from_path`](facts_core::FilingInput::from_path) derives the
//! filing identifier from the directory name.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use facts_core::{FactError, Result};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Directory of the filer's own documents inside an archive.
const PUBLIC_DOC_DIR: &str = "PublicDoc";

fn is_instance(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xbrl"))
}

fn archive_error(doc_id: &str, message: impl ToString) -> FactError {
    FactError::Archive {
        doc_id: doc_id.to_string(),
        message: message.to_string(),
    }
}

/// Lists the instance documents already unpacked into `dir`.
///
/// A missing directory has none.
pub fn existing_instances(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut instances = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_instance(&path) {
            instances.push(path);
        }
    }
    instances.sort();
    Ok(instances)
}

/// Unpacks the instance documents of the archive at `archive` into `dest`.
///
/// Returns the unpacked paths. When `dest` already holds instance documents
/// the archive is not opened and those are returned.
pub fn extract_instances(archive: &Path, doc_id: &str, dest: &Path) -> Result<Vec<PathBuf>> {
    let existing = existing_instances(dest)?;
    if !existing.is_empty() {
        debug!(doc_id, dest = %dest.display(), "Instances already extracted");
        return Ok(existing);
    }
    let file = File::open(archive)?;
    extract_instances_from(file, doc_id, dest)
}

/// Unpacks the instance documents of an archive read from `reader`.
///
/// Entries under `PublicDoc` win; any other `.xbrl` entry is used only when
/// the archive has none there. Entries whose names escape the archive root
/// are skipped.
pub fn extract_instances_from<R: Read + Seek>(
    reader: R,
    doc_id: &str,
    dest: &Path,
) -> Result<Vec<PathBuf>> {
    let mut archive = ZipArchive::new(reader).map_err(|e| archive_error(doc_id, e))?;

    let mut candidates = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| archive_error(doc_id, e))?;
        if entry.is_dir() {
            continue;
        }
        let Some(path) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!(doc_id, name = entry.name(), "Skipping archive entry outside the root");
            continue;
        };
        if is_instance(&path) {
            let public = path.components().any(|c| c.as_os_str() == PUBLIC_DOC_DIR);
            candidates.push((index, path, public));
        }
    }

    let has_public = candidates.iter().any(|(_, _, public)| *public);
    let selected: Vec<_> = candidates
        .into_iter()
        .filter(|(_, _, public)| *public || !has_public)
        .collect();
    if selected.is_empty() {
        return Err(archive_error(doc_id, "no XBRL instance documents"));
    }

    fs::create_dir_all(dest)?;
    let mut written = Vec::new();
    let mut names = HashSet::new();
    for (index, path, _) in selected {
        let Some(name) = path.file_name() else {
            continue;
        };
        if !names.insert(name.to_os_string()) {
            warn!(doc_id, entry = %path.display(), "Duplicate instance name; keeping the first");
            continue;
        }
        let target = dest.join(name);
        if let Err(error) = unpack_entry(&mut archive, index, &target, doc_id) {
            for path in &written {
                let _ = fs::remove_file(path);
            }
            let _ = fs::remove_file(&target);
            return Err(error);
        }
        written.push(target);
    }

    written.sort();
    debug!(doc_id, count = written.len(), dest = %dest.display(), "Extracted instances");
    Ok(written)
}

fn unpack_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    target: &Path,
    doc_id: &str,
) -> Result<()> {
    let mut entry = archive
        .by_index(index)
        .map_err(|e| archive_error(doc_id, e))?;
    let mut out = File::create(target)?;
    io::copy(&mut entry, &mut out).map_err(|e| archive_error(doc_id, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const INSTANCE_NAME: &str = "jpcrp030000-asr-001_E05325-000_2025-03-31_01_2025-06-25.xbrl";

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn file_names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_extracts_public_instance() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("raw_xbrl/2025/S100W67S");
        let public = format!("XBRL/PublicDoc/{INSTANCE_NAME}");
        let bytes = build_zip(&[
            ("XBRL/", ""),
            ("XBRL/PublicDoc/", ""),
            (public.as_str(), "<xbrli:xbrl/>"),
            ("XBRL/PublicDoc/jpcrp030000-asr-001.xsd", "<schema/>"),
            ("XBRL/AuditDoc/jpaud-aar-cn-001.xbrl", "<audit/>"),
        ]);

        let instances = extract_instances_from(Cursor::new(bytes), "S100W67S", &dest).unwrap();

        assert_eq!(file_names(&instances), vec![INSTANCE_NAME]);
        assert_eq!(instances[0].parent().unwrap(), dest);
        assert_eq!(fs::read_to_string(&instances[0]).unwrap(), "<xbrli:xbrl/>");
        assert!(!dest.join("jpaud-aar-cn-001.xbrl").exists());
    }

    #[test]
    fn test_falls_back_to_any_instance() {
        let dir = TempDir::new().unwrap();
        let bytes = build_zip(&[("S100W67S/filing.xbrl", "<xbrli:xbrl/>")]);

        let instances =
            extract_instances_from(Cursor::new(bytes), "S100W67S", dir.path()).unwrap();
        assert_eq!(file_names(&instances), vec!["filing.xbrl"]);
    }

    #[test]
    fn test_archive_without_instances() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("S100W67S");
        let bytes = build_zip(&[("XBRL/PublicDoc/0101010_honbun.htm", "<html/>")]);

        let err = extract_instances_from(Cursor::new(bytes), "S100W67S", &dest).unwrap_err();
        assert!(matches!(err, FactError::Archive { ref doc_id, .. } if doc_id == "S100W67S"));
        assert!(existing_instances(&dest).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = TempDir::new().unwrap();
        let err = extract_instances_from(Cursor::new(b"not a zip".to_vec()), "S100W67S", dir.path())
            .unwrap_err();
        assert!(matches!(err, FactError::Archive { .. }));
    }

    #[test]
    fn test_escaping_entry_is_skipped() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("raw_xbrl/S100W67S");
        let bytes = build_zip(&[
            ("../../escaped.xbrl", "<evil/>"),
            ("XBRL/PublicDoc/filing.xbrl", "<xbrli:xbrl/>"),
        ]);

        let instances = extract_instances_from(Cursor::new(bytes), "S100W67S", &dest).unwrap();
        assert_eq!(file_names(&instances), vec!["filing.xbrl"]);
        assert!(!dir.path().join("escaped.xbrl").exists());
    }

    #[test]
    fn test_existing_instances_skip_extraction() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("S100W67S");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join(INSTANCE_NAME), "<xbrli:xbrl/>").unwrap();
        let archive = dir.path().join("S100W67S.zip");
        fs::write(&archive, b"not a zip").unwrap();

        let instances = extract_instances(&archive, "S100W67S", &dest).unwrap();
        assert_eq!(file_names(&instances), vec![INSTANCE_NAME]);
    }

    #[test]
    fn test_extracted_instance_feeds_filing_input() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("raw_zip/2025/S100W67S.zip");
        let dest = dir.path().join("raw_xbrl/2025/S100W67S");
        fs::create_dir_all(archive.parent().unwrap()).unwrap();
        let public = format!("XBRL/PublicDoc/{INSTANCE_NAME}");
        fs::write(&archive, build_zip(&[(public.as_str(), "<xbrli:xbrl/>")])).unwrap();

        let instances = extract_instances(&archive, "S100W67S", &dest).unwrap();
        let input = facts_core::FilingInput::from_path(&instances[0]).unwrap();

        assert_eq!(input.doc_id, "S100W67S");
        assert_eq!(input.report_type, Some(facts_core::ReportType::Annual));
    }
}
