//! CLI entry point for the photo harvester.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use harvester_core::Harvester;
use tracing::{debug, info, warn};

mod app;
mod app_config;
mod cli;

use app::config_runtime::{build_harvest_config, display_path, resolve_default_log_level};
use app::progress::BarProgress;
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(resolve_default_log_level(&args)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_config(args.config.as_deref())?;
    if loaded.loaded_from_file() {
        info!(path = %display_path(loaded.path.as_ref()), "Loaded config file");
    } else {
        debug!(path = %display_path(loaded.path.as_ref()), "No config file found");
    }

    let config = build_harvest_config(&args, loaded.config.as_ref())?;
    info!(
        input = %config.input_root.display(),
        output = %config.output_root.display(),
        workers = config.workers,
        max_images = ?config.max_images,
        "Photo harvester starting"
    );

    let harvester = Harvester::new(config)?;
    let progress = BarProgress::new(!args.quiet && io::stderr().is_terminal());
    let summary = harvester.run(&progress).await?;
    progress.finish();

    if summary.batches == 0 && summary.unreadable_batches == 0 {
        info!("No batches found; nothing to download");
        return Ok(());
    }

    info!(
        batches = summary.batches,
        discovered = summary.discovered,
        duplicates = summary.duplicates,
        skipped_records = summary.skipped_records,
        submitted = summary.submitted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        cap_reached = summary.cap_reached,
        "Harvest complete"
    );
    if summary.failed > 0 {
        warn!(failures = %summary.failure_breakdown(), "Some photos failed");
    }
    if summary.unreadable_batches > 0 {
        warn!(
            unreadable = summary.unreadable_batches,
            "Some batch files could not be read"
        );
    }

    Ok(())
}
