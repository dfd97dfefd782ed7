//! Photo Harvester Core Library
//!
//! This library provides the fetch pipeline behind the `photo-harvester` tool:
//! it takes the JSON batches written by a photo-search crawl, deduplicates the
//! photos they describe, and downloads each one through a fixed-size worker
//! pool (thumbnail validation first, then the original image).
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`descriptor`] - Photo descriptors and URL derivation
//! - [`dedup`] - Run-wide set of already-enqueued photo ids
//! - [`fetch`] - HTTP client, retry policy and the two-phase fetch worker
//! - [`pool`] - Bounded worker pool with completion-order result draining
//! - [`batch`] - Batch discovery and record parsing
//! - [`harvest`] - The ingestion loop tying everything together
//! - [`manifest`] - JSON-lines metadata for successful downloads
//! - [`config`] - Run options and output layout

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod dedup;
pub mod descriptor;
pub mod fetch;
pub mod harvest;
pub mod manifest;
pub mod pool;
mod user_agent;

// Re-export commonly used types
pub use batch::{Batch, BatchError, discover_batches, load_batch};
pub use config::{DEFAULT_WORKERS, HarvestConfig, MAX_RETRIES, MAX_WORKERS};
pub use dedup::SeenSet;
pub use descriptor::{DescriptorError, PhotoDescriptor, PhotoSize, StaticHost};
pub use fetch::{
    DEFAULT_MAX_RETRIES, FailureKind, FailureType, FetchError, FetchWorker, HttpClient,
    ImageMeta, MIN_THUMBNAIL_EDGE_PX, PhotoFetcher, RetryDecision, RetryPolicy, TransportError,
    classify_error,
};
pub use harvest::{HarvestError, HarvestSummary, Harvester, NoProgress, ProgressReporter};
pub use manifest::{ManifestError, ManifestWriter};
pub use pool::{FetchResult, PoolError, WorkerPool};
