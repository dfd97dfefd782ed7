//! Error types for photo descriptors.

use thiserror::Error;

use super::PhotoSize;

/// Errors raised while building a descriptor or deriving its URLs.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The batch record cannot describe a fetchable photo.
    #[error("invalid photo record: {reason}")]
    InvalidDescriptor {
        /// What was wrong with the record.
        reason: String,
    },

    /// No URL can be built for the requested size.
    #[error("no {size} URL for photo {id}: farm is unknown and no explicit URL was recorded")]
    UnsupportedSize {
        /// The photo id.
        id: String,
        /// The requested size.
        size: PhotoSize,
    },
}

impl DescriptorError {
    /// Creates an invalid-descriptor error for a missing required field.
    pub fn missing_field(field: &str) -> Self {
        Self::InvalidDescriptor {
            reason: format!("missing required field `{field}`"),
        }
    }

    /// Creates an invalid-descriptor error with a free-form reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            reason: reason.into(),
        }
    }

    /// Creates an unsupported-size error.
    pub fn unsupported_size(id: impl Into<String>, size: PhotoSize) -> Self {
        Self::UnsupportedSize {
            id: id.into(),
            size,
        }
    }
}
