//! The seam between tab state and an actual web engine.

use crate::events::SurfaceEvent;
use crate::history::SessionHistory;
use url::Url;

/// A renderable page host: one per live tab.
///
/// Implementations wrap a real engine (WKWebView, CEF, a remote content
/// process) or the in-memory [`crate::HeadlessSurface`]. All navigation calls
/// are fire-and-forget; results come back through [`Self::drain_events`],
/// which the tab layer polls. Surfaces must tolerate calls that do not apply
/// (e.g. `go_back` at the start of history) by ignoring them.
pub trait ContentSurface: Send {
    /// Begin loading `url`, truncating any forward history.
    fn load(&mut self, url: &Url);

    /// Navigate one entry back, if possible.
    fn go_back(&mut self);

    /// Navigate one entry forward, if possible.
    fn go_forward(&mut self);

    /// Reload the committed entry.
    fn reload(&mut self);

    /// Cancel an in-flight load.
    fn stop(&mut self);

    /// Snapshot the back/forward list.
    fn session_history(&self) -> SessionHistory;

    /// Replace the back/forward list with a previously captured snapshot.
    ///
    /// Invalid snapshots (empty, index out of bounds) must be ignored with a
    /// warning rather than adopted.
    fn restore_session(&mut self, history: &SessionHistory);

    /// Render the current page to an encoded image, if one is available.
    fn capture_screenshot(&mut self) -> Option<Vec<u8>>;

    /// Take all events queued since the previous drain.
    fn drain_events(&mut self) -> Vec<SurfaceEvent>;
}

/// Creates surfaces on demand.
///
/// The tab manager materializes dormant tabs lazily; the factory is how it
/// reaches the engine without depending on one. `incognito` surfaces must not
/// share cookies, cache, or other site data with normal ones.
pub trait SurfaceFactory: Send {
    fn create(&self, incognito: bool) -> Box<dyn ContentSurface>;
}
