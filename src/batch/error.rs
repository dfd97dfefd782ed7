//! Error types for batch file loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that make a whole batch file unusable.
///
/// Malformed records inside a readable batch are not errors; they are
/// skipped and counted on the [`Batch`](super::Batch).
#[derive(Debug, Error)]
pub enum BatchError {
    /// The file could not be read.
    #[error("failed to read batch {path}: {source}")]
    Read {
        /// Path of the batch file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("failed to parse batch {path}: {source}")]
    Parse {
        /// Path of the batch file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The JSON document is not an array of records.
    #[error("batch {path} is not a JSON array")]
    NotArray {
        /// Path of the batch file.
        path: PathBuf,
    },
}

impl BatchError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Creates a not-an-array error.
    pub fn not_array(path: impl Into<PathBuf>) -> Self {
        Self::NotArray { path: path.into() }
    }
}
