//! Bounded archive of recently closed tabs.

use crate::session::SavedTab;
use std::collections::VecDeque;

/// Most-recent-first ring of closed tab records.
///
/// Closing a tab files its full saved record here (history, lineage, strip
/// index), so reopen can rebuild the tab where it was. The ring is bounded;
/// pushing past capacity evicts the oldest entries. Incognito partitions keep
/// their own ring, wiped when the partition is torn down and never persisted.
#[derive(Debug, Default)]
pub struct RecentlyClosed {
    entries: VecDeque<SavedTab>,
}

impl RecentlyClosed {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a closed tab record, evicting the oldest past `capacity`.
    ///
    /// Capacity zero disables archiving.
    pub fn push(&mut self, record: SavedTab, capacity: usize) {
        if capacity == 0 {
            return;
        }
        self.entries.push_front(record);
        while self.entries.len() > capacity {
            self.entries.pop_back();
        }
    }

    /// Take the most recently closed record.
    pub fn pop(&mut self) -> Option<SavedTab> {
        self.entries.pop_front()
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &SavedTab> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
