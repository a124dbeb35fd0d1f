//! Serializable back/forward list snapshot.

use serde::{Deserialize, Serialize};
use url::Url;

/// A surface's back/forward list at a point in time.
///
/// `entries` is ordered oldest to newest and `current_index` points at the
/// committed entry. A history with no entries never leaves a live engine;
/// snapshots are validated before they are persisted or restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    pub entries: Vec<Url>,
    pub current_index: usize,
}

impl SessionHistory {
    pub fn new(entries: Vec<Url>, current_index: usize) -> Self {
        Self {
            entries,
            current_index,
        }
    }

    /// History holding a single committed entry.
    pub fn single(url: Url) -> Self {
        Self {
            entries: vec![url],
            current_index: 0,
        }
    }

    /// True when there is at least one entry and the index is in bounds.
    pub fn is_valid(&self) -> bool {
        !self.entries.is_empty() && self.current_index < self.entries.len()
    }

    /// The committed entry, if the snapshot is well-formed.
    pub fn current(&self) -> Option<&Url> {
        self.entries.get(self.current_index)
    }
}
