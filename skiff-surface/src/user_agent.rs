//! Per-host desktop/mobile user agent selection.

use std::collections::HashSet;

/// Decides whether a host should be loaded with the desktop user agent.
///
/// The tab layer consults the policy when a tab is created or navigates, and
/// records the user's choice when they toggle desktop mode on a tab, so the
/// preference sticks for later visits to the same host.
pub trait UserAgentPolicy: Send {
    /// Should pages on `host` use the desktop user agent?
    fn desktop_mode(&self, host: &str) -> bool;

    /// Record a per-host override.
    fn set_desktop_mode(&mut self, host: &str, desktop: bool);
}

/// In-memory policy: a set of hosts pinned to the desktop user agent.
///
/// Not persisted; hosts reset to mobile on restart.
#[derive(Debug, Default)]
pub struct MemoryUserAgentPolicy {
    desktop_hosts: HashSet<String>,
}

impl MemoryUserAgentPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserAgentPolicy for MemoryUserAgentPolicy {
    fn desktop_mode(&self, host: &str) -> bool {
        self.desktop_hosts.contains(host)
    }

    fn set_desktop_mode(&mut self, host: &str, desktop: bool) {
        if desktop {
            self.desktop_hosts.insert(host.to_string());
        } else {
            self.desktop_hosts.remove(host);
        }
    }
}
