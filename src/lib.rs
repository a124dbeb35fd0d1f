// Library exports for the tab/session core
//
// # Threading Policy
//
// skiff keeps all tab-collection mutation on one thread. New code should
// follow these rules:
//
//   - `TabManager`            — single-writer. Owned by the host's main
//                               context; it is Send but deliberately not
//                               shared. Engine callbacks are pulled in via
//                               `pump_surface_events()` on that same thread,
//                               never pushed from elsewhere.
//
//   - `parking_lot::Mutex`    — use for the small shared-state islands that
//                               do cross threads (observer registry, save
//                               generation gate, screenshot cache). Locks are
//                               released before any callback runs.
//
//   - blocking I/O            — session writes go through `Persister`, which
//                               runs them on `tokio::task::spawn_blocking`;
//                               nothing else leaves the owner thread.

#[macro_use]
pub mod debug;

pub mod error;
pub mod routing;
pub mod screenshot;
pub mod session;
pub mod tab;

pub use error::StoreError;
pub use routing::{NavigationPath, Router};
pub use screenshot::ScreenshotStore;
pub use session::{Persister, SavedTab, SessionState, SessionStore};
pub use tab::{AddTabRequest, Tab, TabEvent, TabId, TabManager, TabObserver};
