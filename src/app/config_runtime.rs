use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use harvester_core::{HarvestConfig, StaticHost};

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Layers CLI flags over the config file over built-in defaults.
///
/// A value given on the command line always wins; a `--no-*` flag only
/// turns a feature off, so a file value applies when the flag is absent.
pub(crate) fn build_harvest_config(
    args: &Args,
    file_config: Option<&FileConfig>,
) -> Result<HarvestConfig> {
    let file = file_config.cloned().unwrap_or_default();
    let mut config = HarvestConfig::default();

    if let Some(input) = args.input.clone().or(file.input_dir) {
        config.input_root = input;
    }
    if let Some(output) = args.output.clone().or(file.output_dir) {
        config.output_root = output;
    }
    if let Some(workers) = args.workers.or(file.workers) {
        config.workers = usize::from(workers);
    }
    config.max_images = args.max_images.or(file.max_images);
    if let Some(retries) = args.max_retries.or(file.max_retries) {
        config.max_retries = u32::from(retries);
    }
    if let Some(secs) = args.connect_timeout.or(file.connect_timeout_secs) {
        config.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.read_timeout.or(file.read_timeout_secs) {
        config.read_timeout = Duration::from_secs(secs);
    }
    if let Some(host) = args.static_host.clone().or(file.static_host) {
        config.static_host = StaticHost::new(host);
    }

    config.create_subdirs = toggle(args.no_subdirs, file.create_subdirs);
    config.save_thumbnails = toggle(args.no_thumbs, file.save_thumbnails);
    config.write_manifest = toggle(args.no_manifest, file.write_manifest);

    config
        .validate()
        .context("Invalid effective configuration")?;
    Ok(config)
}

fn toggle(disabled_on_cli: bool, file: Option<bool>) -> bool {
    !disabled_on_cli && file.unwrap_or(true)
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn display_path(path: Option<&PathBuf>) -> String {
    path.map_or_else(|| "<none>".to_string(), |p| p.display().to_string())
}
