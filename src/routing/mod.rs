//! Deep-link and universal-link routing
//!
//! External entry points (OS URL opens, widgets, notification taps) hand the
//! app a raw string. `NavigationPath::parse` turns the recognized shapes into
//! typed intents; everything else comes back as None so the caller treats the
//! input as an ordinary navigable URL. `Router` applies a parsed intent
//! against the tab manager.

mod router;

pub use router::Router;

use skiff_config::Config;
use url::Url;

/// A parsed navigation intent.
///
/// Derives equality so double-delivered intents (the same link arriving via
/// two launch channels) can be deduplicated by comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationPath {
    /// Navigate the current tab of the given partition.
    Url { url: Url, incognito: bool },
    /// Open a new selected tab in the given partition.
    OpenInNewTab { url: Url, incognito: bool },
    /// Jump to a workspace page.
    Space { space_id: String },
    /// Run a search through the configured engine.
    Search { query: String },
}

impl NavigationPath {
    /// Parse a raw externally-delivered string into an intent.
    ///
    /// Recognized forms:
    /// - `skiff://open-url?url=<target>[&incognito=1][&new-tab=1]`
    /// - `skiff://space?id=<space>`
    /// - `skiff://search?q=<query>`
    /// - `https://<app_host>/space/<space>` (universal link)
    /// - any other `https://<app_host>/...` link, which opens in a new tab
    ///
    /// Anything else, including malformed query parameters on a recognized
    /// shape, returns None and the caller falls back to treating the input
    /// as a plain URL.
    pub fn parse(raw: &str, config: &Config) -> Option<Self> {
        let link = Url::parse(raw).ok()?;
        match link.scheme() {
            "skiff" => Self::parse_deep_link(&link),
            "http" | "https" => Self::parse_universal_link(&link, config),
            _ => None,
        }
    }

    fn parse_deep_link(link: &Url) -> Option<Self> {
        match link.host_str()? {
            "open-url" => {
                let mut target: Option<Url> = None;
                let mut incognito = false;
                let mut new_tab = false;
                for (key, value) in link.query_pairs() {
                    match key.as_ref() {
                        "url" => target = Url::parse(&value).ok(),
                        "incognito" => incognito = flag(&value),
                        "new-tab" => new_tab = flag(&value),
                        _ => {}
                    }
                }
                let url = target?;
                if new_tab {
                    Some(Self::OpenInNewTab { url, incognito })
                } else {
                    Some(Self::Url { url, incognito })
                }
            }
            "space" => {
                let space_id = link
                    .query_pairs()
                    .find(|(key, _)| key == "id")
                    .map(|(_, value)| value.into_owned())
                    .filter(|id| !id.is_empty())?;
                Some(Self::Space { space_id })
            }
            "search" => {
                let query = link
                    .query_pairs()
                    .find(|(key, _)| key == "q")
                    .map(|(_, value)| value.into_owned())
                    .filter(|q| !q.is_empty())?;
                Some(Self::Search { query })
            }
            _ => None,
        }
    }

    fn parse_universal_link(link: &Url, config: &Config) -> Option<Self> {
        if link.host_str()? != config.app_host {
            return None;
        }
        let segments: Vec<&str> = link
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        if let ["space", space_id] = segments.as_slice() {
            return Some(Self::Space {
                space_id: (*space_id).to_string(),
            });
        }
        // Any other link on our own host entered from outside the app opens
        // in a new tab so the user's current page survives.
        Some(Self::OpenInNewTab {
            url: link.clone(),
            incognito: false,
        })
    }
}

fn flag(value: &str) -> bool {
    matches!(value, "1" | "true")
}
