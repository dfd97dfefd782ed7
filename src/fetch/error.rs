//! Error types for the fetch module.
//!
//! [`TransportError`] describes what went wrong talking to the photo host;
//! [`FetchError`] is the per-photo outcome the pool reports, naming the phase
//! of the two-step fetch that failed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::descriptor::DescriptorError;

/// Errors from a single HTTP GET against the photo host.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS, broken body stream).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL being fetched.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-2xx response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The response body is not a decodable image.
    #[error("undecodable image from {url}: {source}")]
    Decode {
        /// The URL the bytes came from.
        url: String,
        /// The underlying decoder error.
        #[source]
        source: image::ImageError,
    },
}

impl TransportError {
    /// Creates a network error, promoting reqwest timeouts to [`TransportError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an image decode error.
    pub fn decode(url: impl Into<String>, source: image::ImageError) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}

/// Terminal failure for one photo. Never aborts the pool.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The thumbnail could not be fetched or decoded.
    #[error("thumbnail fetch failed: {0}")]
    ThumbnailFetchFailed(#[source] TransportError),

    /// The thumbnail is a placeholder graphic.
    #[error("thumbnail {width}x{height} is below the {min_edge}px validity threshold")]
    ThumbnailInvalid {
        /// Decoded thumbnail width.
        width: u32,
        /// Decoded thumbnail height.
        height: u32,
        /// Minimum accepted longer side.
        min_edge: u32,
    },

    /// The original image could not be fetched.
    #[error("full image fetch failed: {0}")]
    FullFetchFailed(#[source] TransportError),

    /// Writing the thumbnail or the full image to disk failed.
    #[error("IO error writing to {path}: {source}")]
    WriteFailed {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor cannot produce the URL or file name it needs.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The fetch panicked; the pool still reports it as a failure.
    #[error("fetch worker panicked: {message}")]
    WorkerPanicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl FetchError {
    /// Creates a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Returns the coarse failure kind used for run summaries.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ThumbnailFetchFailed(_) => FailureKind::ThumbnailFetch,
            Self::ThumbnailInvalid { .. } => FailureKind::ThumbnailInvalid,
            Self::FullFetchFailed(_) => FailureKind::FullFetch,
            Self::WriteFailed { .. } => FailureKind::Write,
            Self::Descriptor(_) => FailureKind::Descriptor,
            Self::WorkerPanicked { .. } => FailureKind::Panicked,
        }
    }
}

/// Failure categories counted in a run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// [`FetchError::ThumbnailFetchFailed`].
    ThumbnailFetch,
    /// [`FetchError::ThumbnailInvalid`].
    ThumbnailInvalid,
    /// [`FetchError::FullFetchFailed`].
    FullFetch,
    /// [`FetchError::WriteFailed`].
    Write,
    /// [`FetchError::Descriptor`].
    Descriptor,
    /// [`FetchError::WorkerPanicked`].
    Panicked,
}

impl FailureKind {
    /// Returns the stable label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThumbnailFetch => "thumbnail_fetch_failed",
            Self::ThumbnailInvalid => "thumbnail_invalid",
            Self::FullFetch => "full_fetch_failed",
            Self::Write => "write_failed",
            Self::Descriptor => "descriptor_error",
            Self::Panicked => "worker_panicked",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the url
// or path that the source errors do not carry.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PhotoSize;

    #[test]
    fn test_transport_http_status_display() {
        let error = TransportError::http_status("https://example.com/a_n.jpg", 410);
        let msg = error.to_string();
        assert!(msg.contains("410"), "Expected '410' in: {msg}");
        assert!(msg.contains("https://example.com/a_n.jpg"));
    }

    #[test]
    fn test_fetch_error_wraps_phase() {
        let error = FetchError::ThumbnailFetchFailed(TransportError::timeout("https://x/a_n.jpg"));
        let msg = error.to_string();
        assert!(msg.starts_with("thumbnail fetch failed"), "{msg}");
        assert!(msg.contains("timeout"), "{msg}");
        assert_eq!(error.kind(), FailureKind::ThumbnailFetch);
    }

    #[test]
    fn test_thumbnail_invalid_display() {
        let error = FetchError::ThumbnailInvalid {
            width: 50,
            height: 40,
            min_edge: 75,
        };
        assert_eq!(
            error.to_string(),
            "thumbnail 50x40 is below the 75px validity threshold"
        );
    }

    #[test]
    fn test_write_failed_display_has_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = FetchError::write("/tmp/out/1.jpg", io);
        assert!(error.to_string().contains("/tmp/out/1.jpg"));
        assert_eq!(error.kind(), FailureKind::Write);
    }

    #[test]
    fn test_descriptor_error_is_transparent() {
        let error: FetchError = DescriptorError::unsupported_size("9", PhotoSize::Small).into();
        assert!(error.to_string().starts_with("no small URL for photo 9"));
        assert_eq!(error.kind(), FailureKind::Descriptor);
    }

    #[test]
    fn test_failure_kind_labels() {
        assert_eq!(FailureKind::FullFetch.to_string(), "full_fetch_failed");
        assert_eq!(FailureKind::Panicked.as_str(), "worker_panicked");
    }
}
