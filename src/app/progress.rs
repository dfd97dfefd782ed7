//! Progress bar for harvest runs.

use harvester_core::{FetchResult, ProgressReporter};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TEMPLATE: &str = "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}) {msg}";

/// Renders completed/submitted counts on stderr.
///
/// The bar length grows as batches are queued, so the total is only final
/// once ingestion stops.
#[derive(Debug)]
pub(crate) struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Creates a bar; a hidden one when `visible` is false.
    pub(crate) fn new(visible: bool) -> Self {
        let bar = ProgressBar::new(0);
        if visible {
            bar.set_style(
                ProgressStyle::with_template(TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { bar }
    }

    /// Clears the bar from the terminal.
    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> (u64, Option<u64>) {
        (self.bar.position(), self.bar.length())
    }
}

impl ProgressReporter for BarProgress {
    fn on_submitted(&self, submitted: usize) {
        self.bar.set_length(submitted as u64);
    }

    fn on_completed(&self, result: &FetchResult, completed: usize, submitted: usize) {
        self.bar.set_length(submitted as u64);
        self.bar.set_position(completed as u64);
        self.bar
            .set_message(format!("photo {}", result.descriptor().id()));
    }
}
