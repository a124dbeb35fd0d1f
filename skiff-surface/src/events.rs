//! Navigation and security state snapshots, and the events surfaces emit.

use serde::{Deserialize, Serialize};
use url::Url;

/// Back/forward/loading state of a surface, as last reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub loading: bool,
}

/// Connection security of the current page.
///
/// `cert_error` means the engine completed the load despite a certificate
/// problem (user clicked through an interstitial); `secure` is only true for
/// clean TLS loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityState {
    pub secure: bool,
    pub cert_error: bool,
}

/// Events a content surface queues as a page loads and navigates.
///
/// Surfaces buffer these internally; the tab layer pulls them with
/// [`crate::ContentSurface::drain_events`] and folds them into cached tab
/// state. Events carry full payloads so applying them is a plain assignment,
/// never a read-back into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The committed URL changed (navigation, redirect, fragment update).
    UrlChanged(Url),
    /// The document title changed.
    TitleChanged(String),
    /// Back/forward/loading availability changed.
    NavigationStateChanged(NavigationState),
    /// TLS status of the current page changed.
    SecurityStateChanged(SecurityState),
    /// The page advertised a favicon.
    FaviconChanged(Url),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_state_defaults_to_all_false() {
        let state = NavigationState::default();
        assert!(!state.can_go_back);
        assert!(!state.can_go_forward);
        assert!(!state.loading);
    }

    #[test]
    fn surface_events_compare_by_payload() {
        let a = SurfaceEvent::UrlChanged(Url::parse("https://example.com/").unwrap());
        let b = SurfaceEvent::UrlChanged(Url::parse("https://example.com/").unwrap());
        let c = SurfaceEvent::TitleChanged("Example".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
