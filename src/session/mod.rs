//! Session state types for save/restore across launches
//!
//! This module provides crash-safe session persistence: snapshot the normal
//! partition's tabs (history, lineage, selection) into JSON on a background
//! task, then rebuild the strip as dormant tabs on next launch.

pub mod capture;
pub mod persister;
pub mod restore;
pub mod storage;

pub use persister::Persister;
pub use storage::SessionStore;

use crate::tab::TabId;
use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level session state: one partition's strip at the time of save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Timestamp when the session was saved (ISO 8601)
    pub saved_at: String,
    /// Saved tabs in strip order
    pub tabs: Vec<SavedTab>,
}

/// A single tab in a saved session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTab {
    /// Tab identity, preserved across restore
    pub id: TabId,
    /// Group ancestor id
    pub root_id: TabId,
    /// Direct opener, when still known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TabId>,
    /// Workspace this tab belonged to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Partition the tab came from
    #[serde(default)]
    pub incognito: bool,
    /// Title at save time, shown while the restored tab is dormant
    #[serde(default)]
    pub title: String,
    /// Favicon at save time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<Url>,
    /// Back/forward list, oldest first. Never empty in a well-formed record.
    pub history: Vec<Url>,
    /// Index of the committed entry within `history`
    pub current_index: usize,
    /// Whether this tab was the partition's selected tab
    #[serde(default)]
    pub selected: bool,
    /// Position in the strip at save time; restore sorts by this
    pub tab_index: usize,
}

impl SavedTab {
    /// A record is usable when it has at least one history entry and the
    /// committed index is in bounds.
    pub fn is_valid(&self) -> bool {
        !self.history.is_empty() && self.current_index < self.history.len()
    }

    /// The committed URL.
    pub fn current_url(&self) -> Option<&Url> {
        self.history.get(self.current_index)
    }
}
