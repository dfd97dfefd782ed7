//! Binary-side plumbing: config layering and progress rendering.

pub(crate) mod config_runtime;
pub(crate) mod progress;
