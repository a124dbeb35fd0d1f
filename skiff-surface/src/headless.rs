//! Deterministic in-memory surface for tests and the session harness.
//!
//! `HeadlessSurface` keeps a real back/forward list and emits the same event
//! sequences a wrapped engine would, with loads completing synchronously.
//! Titles are synthesized from the URL and screenshots are stable byte
//! strings, so assertions against them are reproducible.

use crate::events::{NavigationState, SecurityState, SurfaceEvent};
use crate::history::SessionHistory;
use crate::surface::{ContentSurface, SurfaceFactory};
use url::Url;

pub struct HeadlessSurface {
    incognito: bool,
    entries: Vec<Url>,
    current: Option<usize>,
    events: Vec<SurfaceEvent>,
}

impl HeadlessSurface {
    pub fn new(incognito: bool) -> Self {
        Self {
            incognito,
            entries: Vec::new(),
            current: None,
            events: Vec::new(),
        }
    }

    pub fn incognito(&self) -> bool {
        self.incognito
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.and_then(|idx| self.entries.get(idx))
    }

    fn navigation_state(&self) -> NavigationState {
        match self.current {
            Some(idx) => NavigationState {
                can_go_back: idx > 0,
                can_go_forward: idx + 1 < self.entries.len(),
                loading: false,
            },
            None => NavigationState::default(),
        }
    }

    /// Queue the event sequence a committed navigation produces.
    fn emit_commit(&mut self) {
        let Some(url) = self.current_url().cloned() else {
            return;
        };
        self.events.push(SurfaceEvent::UrlChanged(url.clone()));
        self.events
            .push(SurfaceEvent::TitleChanged(synthesize_title(&url)));
        self.events.push(SurfaceEvent::SecurityStateChanged(SecurityState {
            secure: url.scheme() == "https",
            cert_error: false,
        }));
        self.events
            .push(SurfaceEvent::NavigationStateChanged(self.navigation_state()));
    }
}

impl ContentSurface for HeadlessSurface {
    fn load(&mut self, url: &Url) {
        if let Some(idx) = self.current {
            self.entries.truncate(idx + 1);
        }
        self.entries.push(url.clone());
        self.current = Some(self.entries.len() - 1);
        self.emit_commit();
    }

    fn go_back(&mut self) {
        if let Some(idx) = self.current
            && idx > 0
        {
            self.current = Some(idx - 1);
            self.emit_commit();
        }
    }

    fn go_forward(&mut self) {
        if let Some(idx) = self.current
            && idx + 1 < self.entries.len()
        {
            self.current = Some(idx + 1);
            self.emit_commit();
        }
    }

    fn reload(&mut self) {
        if self.current.is_some() {
            self.emit_commit();
        }
    }

    fn stop(&mut self) {
        // Loads complete synchronously here; nothing to cancel.
    }

    fn session_history(&self) -> SessionHistory {
        SessionHistory::new(self.entries.clone(), self.current.unwrap_or(0))
    }

    fn restore_session(&mut self, history: &SessionHistory) {
        if !history.is_valid() {
            log::warn!(
                "Ignoring invalid session history ({} entries, index {})",
                history.entries.len(),
                history.current_index
            );
            return;
        }
        self.entries = history.entries.clone();
        self.current = Some(history.current_index);
        self.emit_commit();
    }

    fn capture_screenshot(&mut self) -> Option<Vec<u8>> {
        self.current_url()
            .map(|url| format!("headless-shot:{url}").into_bytes())
    }

    fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Stand-in for a document title: host plus path, or the raw URL when the
/// scheme has no host.
fn synthesize_title(url: &Url) -> String {
    match url.host_str() {
        Some(host) if url.path() != "/" => format!("{}{}", host, url.path()),
        Some(host) => host.to_string(),
        None => url.as_str().to_string(),
    }
}

/// Factory producing [`HeadlessSurface`] instances.
pub struct HeadlessFactory;

impl SurfaceFactory for HeadlessFactory {
    fn create(&self, incognito: bool) -> Box<dyn ContentSurface> {
        Box::new(HeadlessSurface::new(incognito))
    }
}
