//! Tab management for multi-tab browsing
//!
//! This module provides the core tab infrastructure including:
//! - `Tab`: A single browsing session's cached state and engine attachment
//! - `TabManager`: Coordinates the normal and incognito tab strips
//! - `TabId`: Unique identifier for each tab, stable across restore

mod groups;
mod manager;
mod observer;
mod recently_closed;

pub use groups::{TabGroup, derive_groups, group_for};
pub use manager::{AddTabRequest, RestoreToken, TabManager};
pub use observer::{ObserverId, ObserverRegistry, TabEvent, TabObserver};
pub use recently_closed::RecentlyClosed;

use crate::session::SavedTab;
use skiff_surface::{
    ContentSurface, NavigationState, SecurityState, SessionHistory, SurfaceEvent, SurfaceFactory,
};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Unique identifier for a tab
pub type TabId = Uuid;

/// A single browsing session.
///
/// The page itself lives behind `surface`; everything else is state cached
/// from surface events so the tab strip can render without touching the
/// engine. A tab with no surface is *dormant*: it was restored from disk (or
/// reopened from the archive) and holds its back/forward list in
/// `restored_history` until it is selected and materialized.
pub struct Tab {
    /// Stable identity, preserved across save/restore
    pub id: TabId,
    /// Group ancestor: equals `id` for user-opened tabs, inherited from the
    /// opener for tabs opened out of another tab
    pub root_id: TabId,
    /// Direct opener, when this tab was opened from another tab
    pub parent_id: Option<TabId>,
    /// Workspace this tab belongs to
    pub space_id: Option<String>,
    /// Partition membership; fixed at creation
    pub incognito: bool,
    /// Last committed URL reported by the surface
    pub url: Option<Url>,
    /// Document title (empty until the page reports one)
    pub title: String,
    /// Favicon advertised by the page
    pub favicon_url: Option<Url>,
    /// TLS status of the current page
    pub security: SecurityState,
    /// Back/forward/loading availability
    pub navigation: NavigationState,
    /// Whether this tab requests the desktop user agent
    pub desktop_site: bool,
    /// Key into the screenshot store; cleared whenever the URL changes
    pub screenshot_id: Option<Uuid>,
    /// Engine attachment; None while dormant
    surface: Option<Box<dyn ContentSurface>>,
    /// Back/forward list carried by a dormant tab until materialization
    restored_history: Option<SessionHistory>,
    /// Load requested while dormant, replayed on materialization
    pending_load: Option<Url>,
}

impl Tab {
    /// Create a live tab attached to a freshly created surface.
    pub(crate) fn new(
        id: TabId,
        root_id: TabId,
        parent_id: Option<TabId>,
        space_id: Option<String>,
        incognito: bool,
        desktop_site: bool,
        surface: Box<dyn ContentSurface>,
    ) -> Self {
        Self {
            id,
            root_id,
            parent_id,
            space_id,
            incognito,
            url: None,
            title: String::new(),
            favicon_url: None,
            security: SecurityState::default(),
            navigation: NavigationState::default(),
            desktop_site,
            screenshot_id: None,
            surface: Some(surface),
            restored_history: None,
            pending_load: None,
        }
    }

    /// Rebuild a dormant tab from a persisted record.
    ///
    /// The caller has already validated the record; the committed history
    /// entry becomes the cached URL so the strip can render the tab without
    /// an engine.
    pub(crate) fn from_saved(record: &SavedTab) -> Self {
        let history = SessionHistory::new(record.history.clone(), record.current_index);
        let url = history.current().cloned();
        Self {
            id: record.id,
            root_id: record.root_id,
            parent_id: record.parent_id,
            space_id: record.space_id.clone(),
            incognito: record.incognito,
            url,
            title: record.title.clone(),
            favicon_url: record.favicon_url.clone(),
            security: SecurityState::default(),
            navigation: NavigationState::default(),
            desktop_site: false,
            screenshot_id: None,
            surface: None,
            restored_history: Some(history),
            pending_load: None,
        }
    }

    /// A dormant tab has no engine attached yet.
    pub fn is_dormant(&self) -> bool {
        self.surface.is_none()
    }

    /// Host of the current URL, for user agent policy lookups.
    pub fn host(&self) -> Option<&str> {
        self.url.as_ref().and_then(|u| u.host_str())
    }

    /// Navigate this tab.
    ///
    /// Dormant tabs record the request and replay it on materialization; the
    /// cached URL is not touched until the surface commits the load.
    pub fn load(&mut self, url: Url) {
        match self.surface.as_mut() {
            Some(surface) => surface.load(&url),
            None => {
                debug_log!("tab", "Tab {} dormant, queueing load of {}", self.id, url);
                self.pending_load = Some(url);
            }
        }
    }

    /// Navigate one entry back. No-op when dormant or at the start of history.
    pub fn go_back(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.go_back();
        }
    }

    /// Navigate one entry forward. No-op when dormant or at the end of history.
    pub fn go_forward(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.go_forward();
        }
    }

    /// Reload the committed entry. No-op when dormant.
    pub fn reload(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.reload();
        }
    }

    /// Cancel an in-flight load. No-op when dormant.
    pub fn stop(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.stop();
        }
    }

    /// Fold one surface event into cached state.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::UrlChanged(url) => {
                // Any navigation invalidates the stored thumbnail.
                self.screenshot_id = None;
                self.url = Some(url);
            }
            SurfaceEvent::TitleChanged(title) => self.title = title,
            SurfaceEvent::NavigationStateChanged(state) => self.navigation = state,
            SurfaceEvent::SecurityStateChanged(state) => self.security = state,
            SurfaceEvent::FaviconChanged(url) => self.favicon_url = Some(url),
        }
    }

    /// Attach an engine to a dormant tab.
    ///
    /// The carried history is pushed into the new surface first, then any
    /// load that arrived while dormant is replayed on top of it. Calling this
    /// on a live tab is a no-op.
    pub(crate) fn materialize(&mut self, factory: &dyn SurfaceFactory) {
        if self.surface.is_some() {
            return;
        }
        let mut surface = factory.create(self.incognito);
        if let Some(history) = self.restored_history.take() {
            surface.restore_session(&history);
        }
        if let Some(url) = self.pending_load.take() {
            surface.load(&url);
        }
        self.surface = Some(surface);
        debug_info!("tab", "Materialized tab {}", self.id);
    }

    /// Drain events queued by the surface since the last pump.
    pub(crate) fn drain_surface_events(&mut self) -> Vec<SurfaceEvent> {
        match self.surface.as_mut() {
            Some(surface) => surface.drain_events(),
            None => Vec::new(),
        }
    }

    /// Render the current page for the screenshot store.
    pub(crate) fn capture_screenshot(&mut self) -> Option<Vec<u8>> {
        self.surface.as_mut()?.capture_screenshot()
    }

    /// Snapshot the back/forward list for persistence.
    ///
    /// Returns None for tabs that never committed a load; those are skipped
    /// by session capture rather than written as empty records.
    pub fn session_snapshot(&self) -> Option<SessionHistory> {
        if let Some(surface) = self.surface.as_ref() {
            let history = surface.session_history();
            return history.is_valid().then_some(history);
        }
        self.restored_history.clone()
    }
}

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("root_id", &self.root_id)
            .field("parent_id", &self.parent_id)
            .field("incognito", &self.incognito)
            .field("url", &self.url.as_ref().map(|u| u.as_str()))
            .field("title", &self.title)
            .field("dormant", &self.is_dormant())
            .finish()
    }
}

impl Tab {
    /// Create a minimal dormant stub tab for unit testing (no surface)
    #[cfg(test)]
    pub(crate) fn new_stub(id: TabId) -> Self {
        Self {
            id,
            root_id: id,
            parent_id: None,
            space_id: None,
            incognito: false,
            url: None,
            title: String::new(),
            favicon_url: None,
            security: SecurityState::default(),
            navigation: NavigationState::default(),
            desktop_site: false,
            screenshot_id: None,
            surface: None,
            restored_history: None,
            pending_load: None,
        }
    }
}
