//! Shared integration test helpers for skiff.
//!
//! This module provides canonical factory functions and assertion helpers
//! used across the `tests/` integration test suite.
//!
//! # Usage
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{open, test_manager, RecordingObserver};
//! ```
//!
//! Note: Rust integration tests use `mod common;` (not `use`) to bring in
//! helpers from `tests/common/mod.rs`. The `#[allow(dead_code)]` attributes
//! suppress warnings when only a subset of helpers are used per file.

#![allow(dead_code)]

use parking_lot::Mutex;
use skiff::session::SavedTab;
use skiff::tab::{AddTabRequest, TabEvent, TabId, TabManager, TabObserver};
use skiff_config::Config;
use skiff_surface::{HeadlessFactory, MemoryUserAgentPolicy};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Parse a URL that is known to be valid in test data.
pub fn url(s: &str) -> Url {
    Url::parse(s).expect("test URL must parse")
}

/// A manager over the headless surface with default configuration.
pub fn test_manager() -> TabManager {
    manager_with_config(Config::default())
}

/// A manager over the headless surface with a caller-tuned configuration.
pub fn manager_with_config(config: Config) -> TabManager {
    TabManager::new(
        config,
        Box::new(HeadlessFactory),
        Box::new(MemoryUserAgentPolicy::new()),
    )
}

/// Open a tab, pump the surface so its cached state is populated, and
/// return its id.
pub fn open(mgr: &mut TabManager, url_str: &str, incognito: bool, select: bool) -> TabId {
    let id = mgr
        .add_tab(AddTabRequest {
            url: Some(url(url_str)),
            incognito,
            select,
            ..Default::default()
        })
        .expect("add_tab must succeed under test config");
    mgr.pump_surface_events();
    id
}

/// Open a tab out of another tab (shares the opener's group root).
pub fn open_from(mgr: &mut TabManager, url_str: &str, opener: TabId, select: bool) -> TabId {
    let id = mgr
        .add_tab(AddTabRequest {
            url: Some(url(url_str)),
            opener: Some(opener),
            select,
            ..Default::default()
        })
        .expect("add_tab must succeed under test config");
    mgr.pump_surface_events();
    id
}

/// Ids of one partition's strip, in order.
pub fn strip_ids(mgr: &TabManager, incognito: bool) -> Vec<TabId> {
    mgr.tabs(incognito).iter().map(|t| t.id).collect()
}

/// Build a restore record with a single-entry history.
pub fn saved_tab(url_str: &str, tab_index: usize, selected: bool) -> SavedTab {
    let id = Uuid::new_v4();
    SavedTab {
        id,
        root_id: id,
        parent_id: None,
        space_id: None,
        incognito: false,
        title: String::new(),
        favicon_url: None,
        history: vec![url(url_str)],
        current_index: 0,
        selected,
        tab_index,
    }
}

/// Buffers every delivered tab event for later assertion.
///
/// The registry holds observers weakly, so tests must keep the returned
/// `Arc` alive for as long as they want events recorded.
pub struct RecordingObserver {
    events: Mutex<Vec<TabEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    /// Take everything recorded so far.
    pub fn drain(&self) -> Vec<TabEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl TabObserver for RecordingObserver {
    fn on_tab_event(&self, event: &TabEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Assert the manager's core invariants: the partitions are disjoint, every
/// tab's `incognito` flag matches the strip it sits in, and the selection of
/// each partition (when set) refers to a member of that partition.
pub fn assert_invariants(mgr: &TabManager) {
    for incognito in [false, true] {
        for tab in mgr.tabs(incognito) {
            assert_eq!(
                tab.incognito, incognito,
                "tab {} sits in the wrong partition",
                tab.id
            );
        }
        if let Some(selected) = mgr.selected_in(incognito) {
            assert!(
                mgr.tabs(incognito).iter().any(|t| t.id == selected),
                "selection {selected} is not a member of its partition"
            );
        }
    }
    let normal = strip_ids(mgr, false);
    assert!(
        !mgr.tabs(true).iter().any(|t| normal.contains(&t.id)),
        "a tab appears in both partitions"
    );
}
