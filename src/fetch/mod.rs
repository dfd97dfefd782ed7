//! Photo fetching: HTTP transport, retry policy and the fetch worker.
//!
//! # Features
//!
//! - Bounded timeouts on every request (30s connect, 5min total by default)
//! - Thumbnail header decoding to filter placeholder images
//! - Streaming writes of originals with cleanup of partial files
//! - Structured error types naming the phase that failed
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::descriptor::PhotoDescriptor;
//! use harvester_core::fetch::{FetchWorker, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let worker = FetchWorker::new(HttpClient::new()?, "./output/images")
//!     .with_thumbs_root("./output/thumbs");
//! let photo = PhotoDescriptor::new("123", Some("abc".into()), Some("65535".into()))?
//!     .with_farm("66");
//! let meta = worker.try_download(&photo, Some("20210101_0500")).await?;
//! println!("Downloaded: {}", meta.img_path.display());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod retry;
mod worker;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, MIN_THUMBNAIL_EDGE_PX, READ_TIMEOUT_SECS};
pub use error::{FailureKind, FetchError, TransportError};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
pub use worker::{
    FetchWorker, ImageMeta, PhotoFetcher, is_thumbnail_valid, thumbnail_dimensions,
};
