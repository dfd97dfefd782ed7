//! User-Agent string for requests to the photo host.

/// Default User-Agent for photo requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("photo-harvester/{version} (dataset-builder)")
}
