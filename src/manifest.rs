//! Metadata manifest for downloaded photos.
//!
//! One JSON object per line: the photo's crawl record plus the `img_path` of
//! the stored full image, relative to the images root. The file is opened in
//! append mode so repeated runs over the same output accumulate.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use crate::descriptor::PhotoDescriptor;
use crate::fetch::ImageMeta;

/// Errors produced while writing the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// I/O error on the manifest file.
    #[error("I/O error on manifest {path}: {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization error (non UTF-8 paths).
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ManifestError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    #[serde(flatten)]
    descriptor: &'a PhotoDescriptor,
    #[serde(flatten)]
    meta: &'a ImageMeta,
}

/// Buffered JSON-lines writer for the manifest.
#[derive(Debug)]
pub struct ManifestWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl ManifestWriter {
    /// Opens `path` for appending, creating it and its parents if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be opened.
    #[instrument(level = "debug", fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, ManifestError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ManifestError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| ManifestError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    /// Appends one line for a downloaded photo.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if serialization or the write fails.
    pub async fn append(
        &mut self,
        descriptor: &PhotoDescriptor,
        meta: &ImageMeta,
    ) -> Result<(), ManifestError> {
        let mut line = serde_json::to_vec(&ManifestEntry { descriptor, meta })?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .map_err(|e| ManifestError::io(&self.path, e))?;
        self.entries += 1;
        Ok(())
    }

    /// Flushes buffered lines to disk.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the flush fails.
    pub async fn finish(mut self) -> Result<usize, ManifestError> {
        self.writer
            .flush()
            .await
            .map_err(|e| ManifestError::io(&self.path, e))?;
        debug!(entries = self.entries, "manifest flushed");
        Ok(self.entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;

    fn photo() -> PhotoDescriptor {
        PhotoDescriptor::new("42", Some("abc".into()), Some("65535".into()))
            .unwrap()
            .with_owner("owner@N00")
            .with_farm("66")
            .with_original_size(1024, 768)
    }

    #[tokio::test]
    async fn test_append_writes_record_with_img_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/metadata.jsonl");

        let mut writer = ManifestWriter::open(&path).await.unwrap();
        let meta = ImageMeta {
            img_path: PathBuf::from("batch/42_abc.jpg"),
        };
        writer.append(&photo(), &meta).await.unwrap();
        assert_eq!(writer.finish().await.unwrap(), 1);

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 1);

        let value: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["secret"], "abc");
        assert_eq!(value["farm"], "66");
        assert_eq!(value["size_o"], serde_json::json!([1024, 768]));
        assert_eq!(value["img_path"], "batch/42_abc.jpg");
        assert!(value.get("title").is_none());
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.jsonl");
        let meta = ImageMeta {
            img_path: PathBuf::from("42_abc.jpg"),
        };

        for _ in 0..2 {
            let mut writer = ManifestWriter::open(&path).await.unwrap();
            writer.append(&photo(), &meta).await.unwrap();
            writer.finish().await.unwrap();
        }

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }
}
