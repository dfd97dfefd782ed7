//! Run options for a harvest.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::descriptor::StaticHost;
use crate::fetch::{CONNECT_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, READ_TIMEOUT_SECS};
use crate::harvest::HarvestError;

/// Default number of fetch workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Maximum number of fetch workers.
pub const MAX_WORKERS: usize = 100;

/// Maximum retries per photo.
pub const MAX_RETRIES: u32 = 10;

const DEFAULT_INPUT_DIR: &str = "./crawled";
const DEFAULT_OUTPUT_DIR: &str = "./output";
const IMAGES_DIR: &str = "images";
const THUMBS_DIR: &str = "thumbs";
const MANIFEST_FILE: &str = "metadata.jsonl";

/// Everything a [`Harvester`](crate::Harvester) needs to run.
///
/// Output layout under `output_root`:
///
/// ```text
/// images/[{batch}/]{basename}
/// thumbs/[{batch}/]{basename}   (when save_thumbnails)
/// metadata.jsonl                (when write_manifest)
/// ```
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Directory searched recursively for `*.json` batches.
    pub input_root: PathBuf,
    /// Directory receiving images, thumbnails and the manifest.
    pub output_root: PathBuf,
    /// Group files by batch file stem.
    pub create_subdirs: bool,
    /// Number of concurrent fetch workers (1-100).
    pub workers: usize,
    /// Stop ingesting once more than this many photos were submitted.
    /// `None` or `Some(0)` means no cap.
    pub max_images: Option<usize>,
    /// Keep validated thumbnails on disk.
    pub save_thumbnails: bool,
    /// Append one manifest line per downloaded photo.
    pub write_manifest: bool,
    /// Extra attempts for transient failures (0-10).
    pub max_retries: u32,
    /// TCP connect timeout for each request.
    pub connect_timeout: Duration,
    /// Total timeout for each request, body included.
    pub read_timeout: Duration,
    /// Host template used to synthesize photo URLs.
    pub static_host: StaticHost,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from(DEFAULT_INPUT_DIR),
            output_root: PathBuf::from(DEFAULT_OUTPUT_DIR),
            create_subdirs: true,
            workers: DEFAULT_WORKERS,
            max_images: None,
            save_thumbnails: true,
            write_manifest: true,
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            static_host: StaticHost::default(),
        }
    }
}

impl HarvestConfig {
    /// Creates a config with default options for the given roots.
    #[must_use]
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    /// Root of full images.
    #[must_use]
    pub fn images_root(&self) -> PathBuf {
        self.output_root.join(IMAGES_DIR)
    }

    /// Root of thumbnails.
    #[must_use]
    pub fn thumbs_root(&self) -> PathBuf {
        self.output_root.join(THUMBS_DIR)
    }

    /// Path of the metadata manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.output_root.join(MANIFEST_FILE)
    }

    /// Input root as a path.
    #[must_use]
    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    /// Returns the effective cap, treating zero as no cap.
    #[must_use]
    pub fn image_cap(&self) -> Option<usize> {
        self.max_images.filter(|cap| *cap > 0)
    }

    /// Checks option ranges.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidConfig`] naming the first bad option.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(HarvestError::invalid_config(format!(
                "workers must be between 1 and {MAX_WORKERS}, got {}",
                self.workers
            )));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(HarvestError::invalid_config(format!(
                "max_retries must be at most {MAX_RETRIES}, got {}",
                self.max_retries
            )));
        }
        if self.connect_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(HarvestError::invalid_config("timeouts must be non-zero"));
        }
        Ok(())
    }
}
