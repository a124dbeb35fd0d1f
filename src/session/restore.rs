//! Pure helpers for turning persisted records back into a strip.

use super::SavedTab;
use crate::tab::TabId;
use std::collections::HashSet;

/// Filter and order a restore batch.
///
/// - Malformed records (empty history, index out of bounds) are skipped with
///   a warning; one bad record never aborts the batch.
/// - Records whose id is already live in `existing` are skipped, making
///   restore idempotent under repeated application of the same snapshot.
/// - Duplicate ids within the batch keep the first occurrence.
/// - Survivors are sorted by `tab_index`; the sort is stable, so records
///   sharing an index keep their batch order.
pub fn prepare_records(records: Vec<SavedTab>, existing: &HashSet<TabId>) -> Vec<SavedTab> {
    let mut seen: HashSet<TabId> = HashSet::new();
    let mut usable: Vec<SavedTab> = Vec::with_capacity(records.len());

    for record in records {
        if !record.is_valid() {
            log::warn!(
                "Session restore: skipping malformed record for tab {} ({} entries, index {})",
                record.id,
                record.history.len(),
                record.current_index
            );
            continue;
        }
        if existing.contains(&record.id) {
            log::debug!("Session restore: tab {} already open, skipping", record.id);
            continue;
        }
        if !seen.insert(record.id) {
            log::warn!(
                "Session restore: duplicate record for tab {}, keeping the first",
                record.id
            );
            continue;
        }
        usable.push(record);
    }

    usable.sort_by_key(|r| r.tab_index);
    usable
}

/// Which restored tab should be selected: the record flagged selected, else
/// the first in strip order.
pub fn selection_hint(records: &[SavedTab]) -> Option<TabId> {
    records
        .iter()
        .find(|r| r.selected)
        .or_else(|| records.first())
        .map(|r| r.id)
}
