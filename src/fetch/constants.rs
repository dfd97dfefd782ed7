//! Constants for the fetch module (timeouts, thumbnail validation).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default total request timeout (5 minutes, originals can be large).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Thumbnails whose longer side is below this are placeholder graphics.
///
/// The host answers requests for deleted or private photos with a small
/// stand-in image and a 200 status instead of an error.
pub const MIN_THUMBNAIL_EDGE_PX: u32 = 75;
