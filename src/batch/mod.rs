//! Discovery and parsing of crawled descriptor batches.
//!
//! A batch is one JSON file holding an array of photo records, as written by
//! the crawl stage. Batches are found recursively under an input root and
//! processed in lexicographic path order.

mod error;

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::descriptor::PhotoDescriptor;

pub use error::BatchError;

/// File extension of batch files.
const BATCH_EXTENSION: &str = "json";

/// One parsed batch file.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Where the batch was read from.
    pub path: PathBuf,
    /// File stem, used as the storage subdirectory when grouping is enabled.
    pub label: String,
    /// Well-formed descriptors in file order.
    pub descriptors: Vec<PhotoDescriptor>,
    /// Records that could not be turned into a descriptor.
    pub skipped: usize,
}

impl Batch {
    /// Number of records in the file, well-formed or not.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.descriptors.len() + self.skipped
    }
}

/// Lists every `*.json` file below `root`, sorted by path.
///
/// A missing root yields an empty list. Unreadable directory entries are
/// logged and ignored. This walks the file system synchronously; async
/// callers run it on the blocking pool.
#[instrument(level = "debug", fields(root = %root.display()))]
pub fn discover_batches(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        debug!("input root is not a directory, no batches");
        return Vec::new();
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_file()
                    && path.extension().is_some_and(|ext| ext == BATCH_EXTENSION)
                {
                    paths.push(entry.into_path());
                }
            }
            Err(e) => warn!(error = %e, "error walking input directory"),
        }
    }

    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    debug!(count = paths.len(), "batches discovered");
    paths
}

/// Reads and parses one batch file.
///
/// # Errors
///
/// Returns [`BatchError`] if the file cannot be read, is not JSON, or is
/// not an array. Individual malformed records are skipped, not errors.
#[instrument(level = "debug", fields(path = %path.display()))]
pub async fn load_batch(path: &Path) -> Result<Batch, BatchError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| BatchError::read(path, e))?;
    let document: Value = serde_json::from_slice(&raw).map_err(|e| BatchError::parse(path, e))?;
    let Value::Array(records) = document else {
        return Err(BatchError::not_array(path));
    };

    let mut descriptors = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (index, record) in records.iter().enumerate() {
        match PhotoDescriptor::from_record(record) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                debug!(index, error = %e, "skipping malformed record");
                skipped += 1;
            }
        }
    }

    Ok(Batch {
        path: path.to_path_buf(),
        label: batch_label(path),
        descriptors,
        skipped,
    })
}

fn batch_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn record(id: &str) -> String {
        format!(r#"{{"id": "{id}", "owner": "o", "secret": "s{id}", "server": "65535", "farm": 66}}"#)
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover_batches(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_discover_recurses_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("kw/b")).unwrap();
        fs::write(dir.path().join("kw/b/20200102_0000.json"), "[]").unwrap();
        fs::write(dir.path().join("kw/20200101_0000.json"), "[]").unwrap();
        fs::write(dir.path().join("kw/notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();

        let found = discover_batches(dir.path());
        let relative: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.json"),
                PathBuf::from("kw/20200101_0000.json"),
                PathBuf::from("kw/b/20200102_0000.json"),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_batch_counts_malformed_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("20210101_0500.json");
        let body = format!(
            "[{}, {}, {}, {}, {}]",
            record("1"),
            record("2"),
            r#"{"id": "3", "server": "1"}"#,
            record("4"),
            record("5"),
        );
        fs::write(&path, body).unwrap();

        let batch = load_batch(&path).await.unwrap();
        assert_eq!(batch.path, path);
        assert_eq!(batch.label, "20210101_0500");
        assert_eq!(batch.descriptors.len(), 4);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.record_count(), 5);
        assert_eq!(batch.descriptors[2].id(), "4");
    }

    #[tokio::test]
    async fn test_load_batch_rejects_non_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("obj.json");
        fs::write(&path, r#"{"id": "1"}"#).unwrap();

        let result = load_batch(&path).await;
        assert!(matches!(result, Err(BatchError::NotArray { .. })));
    }

    #[tokio::test]
    async fn test_load_batch_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[{").unwrap();

        let result = load_batch(&path).await;
        assert!(matches!(result, Err(BatchError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_load_batch_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_batch(&dir.path().join("gone.json")).await;
        assert!(matches!(result, Err(BatchError::Read { .. })));
    }
}
