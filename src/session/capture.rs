//! Capture the live tab strip into serializable session state.

use super::{SavedTab, SessionState};
use crate::tab::{Tab, TabId};

/// Snapshot one partition's strip.
///
/// Tabs that never committed a load have nothing worth saving and are
/// skipped; everything else becomes a [`SavedTab`] carrying its strip
/// position, so restore can rebuild the order even if records are filtered
/// later.
pub fn capture_partition(tabs: &[Tab], selected: Option<TabId>) -> SessionState {
    let mut saved = Vec::with_capacity(tabs.len());
    for (index, tab) in tabs.iter().enumerate() {
        let Some(history) = tab.session_snapshot() else {
            log::debug!("Session capture: skipping tab {} with no committed history", tab.id);
            continue;
        };
        saved.push(SavedTab {
            id: tab.id,
            root_id: tab.root_id,
            parent_id: tab.parent_id,
            space_id: tab.space_id.clone(),
            incognito: tab.incognito,
            title: tab.title.clone(),
            favicon_url: tab.favicon_url.clone(),
            history: history.entries,
            current_index: history.current_index,
            selected: selected == Some(tab.id),
            tab_index: index,
        });
    }

    SessionState {
        saved_at: chrono::Utc::now().to_rfc3339(),
        tabs: saved,
    }
}

/// Build the archive record for a single closing tab.
///
/// Same shape as a session record; `tab_index` is the strip slot the tab
/// occupied so reopen can reinsert it there. Returns None for tabs with no
/// committed history, which are not worth archiving.
pub fn capture_closing_tab(tab: &Tab, index: usize) -> Option<SavedTab> {
    let history = tab.session_snapshot()?;
    Some(SavedTab {
        id: tab.id,
        root_id: tab.root_id,
        parent_id: tab.parent_id,
        space_id: tab.space_id.clone(),
        incognito: tab.incognito,
        title: tab.title.clone(),
        favicon_url: tab.favicon_url.clone(),
        history: history.entries,
        current_index: history.current_index,
        selected: false,
        tab_index: index,
    })
}
