//! CLI argument definitions using clap derive macros.
//!
//! Options that can also come from the config file are `Option`s here so the
//! binary can tell "not given" apart from an explicit value.

use std::path::PathBuf;

use clap::Parser;

/// Download the photos described by crawled search batches.
///
/// Reads every `*.json` batch under the input directory, skips photos already
/// queued, checks each photo's thumbnail and stores the original image.
#[derive(Parser, Debug)]
#[command(name = "photo-harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory holding crawled JSON batches [default: ./crawled]
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Directory receiving images, thumbnails and metadata [default: ./output]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Store all images flat instead of one subdirectory per batch
    #[arg(long)]
    pub no_subdirs: bool,

    /// Number of concurrent fetch workers (1-100) [default: 4]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: Option<u8>,

    /// Stop reading batches once more than this many photos were queued (0 for no cap)
    #[arg(short, long, value_name = "N")]
    pub max_images: Option<usize>,

    /// Do not keep validated thumbnails
    #[arg(long)]
    pub no_thumbs: bool,

    /// Do not write metadata.jsonl
    #[arg(long)]
    pub no_manifest: bool,

    /// Retry attempts for transient network failures (0-10) [default: 0]
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// TCP connect timeout in seconds (1-3600) [default: 30]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Total request timeout in seconds (1-3600) [default: 300]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Photo host template, `{farm}` is replaced by the farm id
    #[arg(long, value_name = "URL", hide = true)]
    pub static_host: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
