//! Fixed-size worker pool for photo fetches.
//!
//! The pool owns `N` long-lived worker tasks that share one job queue and one
//! completion channel. Callers submit photos without blocking, then drain
//! results one at a time in completion order.
//!
//! # Concurrency Model
//!
//! - Each worker pulls the next job when idle and runs it to completion
//! - At most `N` fetches are in flight; extra submissions wait in the queue
//! - Workers are interchangeable; no photo is bound to a particular worker
//! - Every submitted photo yields exactly one [`FetchResult`], including
//!   fetches that panic
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use harvester_core::descriptor::PhotoDescriptor;
//! use harvester_core::fetch::{FetchWorker, HttpClient, RetryPolicy};
//! use harvester_core::pool::WorkerPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let worker = FetchWorker::new(HttpClient::new()?, "./output/images");
//! let mut pool = WorkerPool::new(Arc::new(worker), 4, RetryPolicy::default())?;
//!
//! let photo = PhotoDescriptor::new("1", Some("s".into()), Some("sv".into()))?.with_farm("1");
//! pool.submit(photo, None)?;
//!
//! while let Some(result) = pool.next().await {
//!     println!("{} done: {}", result.descriptor().id(), result.is_success());
//! }
//! pool.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::descriptor::PhotoDescriptor;
use crate::fetch::{
    FetchError, ImageMeta, PhotoFetcher, RetryDecision, RetryPolicy, classify_error,
};

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 100;

/// Error type for pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Every worker has exited; no more jobs can run.
    #[error("worker pool is closed")]
    Closed,
}

/// Outcome of one submitted photo.
#[derive(Debug)]
pub enum FetchResult {
    /// The full image was written.
    Fetched {
        /// The submitted photo.
        descriptor: PhotoDescriptor,
        /// Where it was written.
        meta: ImageMeta,
    },
    /// The fetch failed terminally.
    Failed {
        /// The submitted photo.
        descriptor: PhotoDescriptor,
        /// Why it failed.
        error: FetchError,
    },
}

impl FetchResult {
    /// Returns the photo this result belongs to.
    #[must_use]
    pub fn descriptor(&self) -> &PhotoDescriptor {
        match self {
            Self::Fetched { descriptor, .. } | Self::Failed { descriptor, .. } => descriptor,
        }
    }

    /// Returns true for [`FetchResult::Fetched`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

#[derive(Debug)]
struct Job {
    descriptor: PhotoDescriptor,
    subdir: Option<String>,
}

/// Bounded pool of fetch workers.
#[derive(Debug)]
pub struct WorkerPool {
    jobs: mpsc::UnboundedSender<Job>,
    results: mpsc::UnboundedReceiver<FetchResult>,
    workers: Vec<JoinHandle<()>>,
    submitted: usize,
    collected: usize,
}

impl WorkerPool {
    /// Spawns `workers` worker tasks sharing `fetcher`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidWorkerCount`] if `workers` is outside 1-100.
    #[instrument(level = "debug", skip(fetcher, retry_policy))]
    pub fn new(
        fetcher: Arc<dyn PhotoFetcher>,
        workers: usize,
        retry_policy: RetryPolicy,
    ) -> Result<Self, PoolError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(PoolError::InvalidWorkerCount { value: workers });
        }

        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let handles = (0..workers)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&fetcher),
                    Arc::clone(&job_rx),
                    result_tx.clone(),
                    retry_policy.clone(),
                ))
            })
            .collect();

        debug!(
            workers,
            max_attempts = retry_policy.max_attempts(),
            "worker pool started"
        );

        Ok(Self {
            jobs: job_tx,
            results: result_rx,
            workers: handles,
            submitted: 0,
            collected: 0,
        })
    }

    /// Queues a photo for fetching. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] if every worker has exited.
    pub fn submit(
        &mut self,
        descriptor: PhotoDescriptor,
        subdir: Option<String>,
    ) -> Result<(), PoolError> {
        self.jobs
            .send(Job { descriptor, subdir })
            .map_err(|_| PoolError::Closed)?;
        self.submitted += 1;
        Ok(())
    }

    /// Returns true while some submitted photo has not been drained yet.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.collected < self.submitted
    }

    /// Number of submitted photos whose result has not been drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.submitted - self.collected
    }

    /// Total photos submitted so far.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Total results drained so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.collected
    }

    /// Configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Waits for the next completed fetch.
    ///
    /// Returns `None` once nothing is pending.
    pub async fn next(&mut self) -> Option<FetchResult> {
        if !self.has_pending() {
            return None;
        }

        let result = self.results.recv().await;
        match &result {
            Some(_) => self.collected += 1,
            None => warn!(
                pending = self.pending(),
                "all workers exited with results outstanding"
            ),
        }
        result
    }

    /// Returns a completed fetch if one is ready, without waiting.
    pub fn try_next(&mut self) -> Option<FetchResult> {
        if !self.has_pending() {
            return None;
        }

        let result = self.results.try_recv().ok();
        if result.is_some() {
            self.collected += 1;
        }
        result
    }

    /// Closes the job queue and waits for every worker to exit.
    ///
    /// Jobs still queued are run to completion first; drain results before
    /// calling this if you need them.
    pub async fn shutdown(self) {
        let Self { jobs, workers, .. } = self;
        drop(jobs);

        for handle in workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task panicked");
            }
        }
        debug!("worker pool shut down");
    }
}

async fn run_worker(
    worker_id: usize,
    fetcher: Arc<dyn PhotoFetcher>,
    jobs: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    results: mpsc::UnboundedSender<FetchResult>,
    retry_policy: RetryPolicy,
) {
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(job) = next else {
            debug!(worker_id, "job queue closed, worker exiting");
            break;
        };

        let result = fetch_with_retry(fetcher.as_ref(), job, &retry_policy).await;
        if results.send(result).is_err() {
            debug!(worker_id, "result receiver dropped, worker exiting");
            break;
        }
    }
}

async fn fetch_with_retry(
    fetcher: &dyn PhotoFetcher,
    job: Job,
    retry_policy: &RetryPolicy,
) -> FetchResult {
    let Job { descriptor, subdir } = job;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let outcome = AssertUnwindSafe(fetcher.fetch(&descriptor, subdir.as_deref()))
            .catch_unwind()
            .await;

        let error = match outcome {
            Ok(Ok(meta)) => return FetchResult::Fetched { descriptor, meta },
            Ok(Err(error)) => error,
            Err(payload) => FetchError::WorkerPanicked {
                message: panic_message(&*payload),
            },
        };

        match retry_policy.should_retry(classify_error(&error), attempt) {
            RetryDecision::Retry {
                delay,
                attempt: next_attempt,
            } => {
                info!(
                    photo_id = %descriptor.id(),
                    attempt = next_attempt,
                    max_attempts = retry_policy.max_attempts(),
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "retrying photo"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::DoNotRetry { reason } => {
                debug!(photo_id = %descriptor.id(), %reason, "not retrying photo");
                return FetchResult::Failed { descriptor, error };
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
