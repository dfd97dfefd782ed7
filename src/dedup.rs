//! Run-wide deduplication of photo descriptors.
//!
//! The ingestion loop owns the only [`SeenSet`]; it is not shared with the
//! workers, so plain `&mut self` access is enough.

use std::collections::HashSet;

use crate::descriptor::PhotoDescriptor;

/// Ids of every descriptor enqueued so far in this run.
///
/// Grows monotonically; an id is never removed.
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id has already been enqueued.
    #[must_use]
    pub fn already_seen(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Records the id as enqueued.
    pub fn mark_seen(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    /// Marks the descriptor as seen, returning true if it was new.
    ///
    /// This is the single check-and-insert the ingestion loop runs before
    /// each submission.
    pub fn check_and_insert(&mut self, descriptor: &PhotoDescriptor) -> bool {
        if self.already_seen(descriptor.id()) {
            return false;
        }
        self.mark_seen(descriptor.id());
        true
    }

    /// Number of distinct ids seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true when nothing has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
