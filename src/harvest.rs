//! Batch ingestion loop.
//!
//! [`Harvester::run`] walks the input root, feeds every unseen photo to a
//! [`WorkerPool`], and drains results until nothing is pending:
//!
//! 1. Discover `*.json` batches in path order (none ⇒ empty summary)
//! 2. Per batch: parse, dedup by id, submit with the batch label as subdir
//! 3. Collect results that are already done, then check the image cap
//! 4. After the last batch (or the cap), wait for every outstanding result
//!
//! Per-photo failures never abort the run; they are counted by kind in the
//! [`HarvestSummary`].

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::batch::{discover_batches, load_batch};
use crate::config::HarvestConfig;
use crate::dedup::SeenSet;
use crate::fetch::{FailureKind, FetchWorker, HttpClient, PhotoFetcher, RetryPolicy};
use crate::manifest::{ManifestError, ManifestWriter};
use crate::pool::{FetchResult, PoolError, WorkerPool};

/// Errors that stop a harvest before or during setup.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A run option is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The worker pool rejected its settings or closed early.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The manifest could not be opened.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The batch discovery task panicked or was cancelled.
    #[error("batch discovery failed: {0}")]
    Discovery(#[source] tokio::task::JoinError),
}

impl HarvestError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Receives progress events from a running harvest.
///
/// Both methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    /// Called after each batch with the running submission total.
    fn on_submitted(&self, _submitted: usize) {}

    /// Called once per drained result.
    fn on_completed(&self, _result: &FetchResult, _completed: usize, _submitted: usize) {}
}

/// Progress reporter that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Counters for one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Batch files read successfully.
    pub batches: usize,
    /// Batch files skipped because they could not be read or parsed.
    pub unreadable_batches: usize,
    /// Well-formed descriptors seen across all batches.
    pub discovered: usize,
    /// Descriptors dropped because their id was already submitted.
    pub duplicates: usize,
    /// Records that did not form a valid descriptor.
    pub skipped_records: usize,
    /// Photos handed to the pool.
    pub submitted: usize,
    /// Photos whose original was written.
    pub succeeded: usize,
    /// Photos that failed.
    pub failed: usize,
    /// Failures broken down by kind.
    pub failures: BTreeMap<FailureKind, usize>,
    /// True when ingestion stopped early because of the image cap.
    pub cap_reached: bool,
}

impl HarvestSummary {
    fn record(&mut self, result: &FetchResult) {
        match result {
            FetchResult::Fetched { .. } => self.succeeded += 1,
            FetchResult::Failed { error, .. } => {
                self.failed += 1;
                *self.failures.entry(error.kind()).or_default() += 1;
            }
        }
    }

    /// Results drained so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Renders the failure breakdown as `kind=count` pairs.
    #[must_use]
    pub fn failure_breakdown(&self) -> String {
        self.failures
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Drives one harvest over a configured input and output root.
pub struct Harvester {
    config: HarvestConfig,
    fetcher: Arc<dyn PhotoFetcher>,
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Harvester {
    /// Creates a harvester downloading over HTTP with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidConfig`] for out-of-range options and
    /// [`HarvestError::HttpClient`] if the client cannot be built.
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        config.validate()?;
        let client = HttpClient::with_timeouts(config.connect_timeout, config.read_timeout)
            .map_err(HarvestError::HttpClient)?;

        let mut worker = FetchWorker::new(client, config.images_root())
            .with_static_host(config.static_host.clone());
        if config.save_thumbnails {
            worker = worker.with_thumbs_root(config.thumbs_root());
        }

        Ok(Self {
            config,
            fetcher: Arc::new(worker),
        })
    }

    /// Creates a harvester around a custom fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidConfig`] for out-of-range options.
    pub fn with_fetcher(
        config: HarvestConfig,
        fetcher: Arc<dyn PhotoFetcher>,
    ) -> Result<Self, HarvestError> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    /// Run options.
    #[must_use]
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Runs the harvest to completion.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] only for setup failures (discovery, pool,
    /// manifest).
    /// Per-photo failures are counted in the summary instead.
    #[instrument(skip_all, fields(input = %self.config.input_root.display()))]
    pub async fn run(
        &self,
        progress: &dyn ProgressReporter,
    ) -> Result<HarvestSummary, HarvestError> {
        let mut summary = HarvestSummary::default();

        let input_root = self.config.input_root.clone();
        let batch_paths = tokio::task::spawn_blocking(move || discover_batches(&input_root))
            .await
            .map_err(HarvestError::Discovery)?;
        if batch_paths.is_empty() {
            info!("no batches found, nothing to do");
            return Ok(summary);
        }
        info!(batches = batch_paths.len(), "starting harvest");

        let mut manifest = if self.config.write_manifest {
            Some(ManifestWriter::open(&self.config.manifest_path()).await?)
        } else {
            None
        };

        let mut pool = WorkerPool::new(
            Arc::clone(&self.fetcher),
            self.config.workers,
            RetryPolicy::with_max_retries(self.config.max_retries),
        )?;
        let mut seen = SeenSet::new();
        let cap = self.config.image_cap();

        for path in &batch_paths {
            let batch = match load_batch(path).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable batch");
                    summary.unreadable_batches += 1;
                    continue;
                }
            };

            summary.batches += 1;
            summary.skipped_records += batch.skipped;
            let subdir = self.config.create_subdirs.then(|| batch.label.clone());
            let before = summary.submitted;

            for descriptor in batch.descriptors {
                summary.discovered += 1;
                if !seen.check_and_insert(&descriptor) {
                    summary.duplicates += 1;
                    continue;
                }
                pool.submit(descriptor, subdir.clone())?;
                summary.submitted += 1;
            }

            debug!(
                batch = %batch.label,
                path = %batch.path.display(),
                submitted = summary.submitted - before,
                skipped = batch.skipped,
                "batch queued"
            );
            progress.on_submitted(summary.submitted);

            while let Some(result) = pool.try_next() {
                Self::collect(&result, &mut summary, &mut manifest, progress).await;
            }

            if let Some(cap) = cap
                && summary.submitted > cap
            {
                info!(cap, submitted = summary.submitted, "image cap reached");
                summary.cap_reached = true;
                break;
            }
        }

        while let Some(result) = pool.next().await {
            Self::collect(&result, &mut summary, &mut manifest, progress).await;
        }
        pool.shutdown().await;

        if let Some(manifest) = manifest {
            match manifest.finish().await {
                Ok(entries) => debug!(entries, "manifest written"),
                Err(e) => warn!(error = %e, "failed to flush manifest"),
            }
        }

        info!(
            submitted = summary.submitted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            duplicates = summary.duplicates,
            "harvest finished"
        );
        Ok(summary)
    }

    async fn collect(
        result: &FetchResult,
        summary: &mut HarvestSummary,
        manifest: &mut Option<ManifestWriter>,
        progress: &dyn ProgressReporter,
    ) {
        summary.record(result);

        match result {
            FetchResult::Fetched { descriptor, meta } => {
                debug!(
                    photo_id = %descriptor.id(),
                    path = %meta.img_path.display(),
                    "photo stored"
                );
                let write_error = match manifest.as_mut() {
                    Some(writer) => writer.append(descriptor, meta).await.err(),
                    None => None,
                };
                if let Some(e) = write_error {
                    warn!(error = %e, "manifest write failed, disabling manifest");
                    *manifest = None;
                }
            }
            FetchResult::Failed { descriptor, error } => {
                warn!(
                    photo_id = %descriptor.id(),
                    kind = %error.kind(),
                    error = %error,
                    "photo failed"
                );
            }
        }

        progress.on_completed(result, summary.completed(), summary.submitted);
    }
}
