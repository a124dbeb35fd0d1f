//! Tab event fan-out.
//!
//! The manager emits one event per completed operation, after its own state
//! has settled, so observers always see a consistent strip when they read
//! back through the manager. Batch operations (multi-close, restore, wipe)
//! produce one aggregate event rather than one event per tab.

use super::TabId;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Handle for deregistering an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Tab strip change notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    /// A single tab was created. Restored tabs arrive as `TabsRestored`.
    TabAdded {
        id: TabId,
        incognito: bool,
        selected: bool,
    },
    /// A single tab closed. `new_selection` is the fallback chosen in the
    /// same partition, None when the partition emptied.
    TabRemoved {
        id: TabId,
        incognito: bool,
        new_selection: Option<TabId>,
    },
    /// Several tabs closed in one operation.
    TabsRemoved {
        ids: Vec<TabId>,
        incognito: bool,
        new_selection: Option<TabId>,
    },
    /// The visible selection changed, including partition switches.
    SelectionChanged {
        previous: Option<TabId>,
        current: Option<TabId>,
    },
    /// A batch restore landed, in strip order.
    TabsRestored { ids: Vec<TabId>, incognito: bool },
    /// An entire partition was wiped.
    AllTabsRemoved { was_incognito: bool },
}

/// Receives tab events.
///
/// Callbacks run on whichever thread drove the manager; implementations
/// should hand off to their own context rather than block.
pub trait TabObserver: Send + Sync {
    fn on_tab_event(&self, event: &TabEvent);
}

struct RegistryInner {
    next_id: u64,
    observers: Vec<(ObserverId, Weak<dyn TabObserver>)>,
}

/// Weak-reference observer registry.
///
/// Entries hold `Weak` so a dropped observer never blocks delivery; dead
/// entries are pruned on the next notification. The lock is released before
/// callbacks run, so an observer may add or remove observers from inside its
/// callback without deadlocking.
pub struct ObserverRegistry {
    inner: Mutex<RegistryInner>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 0,
                observers: Vec::new(),
            }),
        }
    }

    /// Register an observer, keeping only a weak reference to it.
    pub fn add<T: TabObserver + 'static>(&self, observer: &Arc<T>) -> ObserverId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = ObserverId(inner.next_id);
        inner
            .observers
            .push((id, Arc::downgrade(observer) as Weak<dyn TabObserver>));
        id
    }

    /// Deregister. Returns false when the id was already gone.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.observers.len();
        inner.observers.retain(|(oid, _)| *oid != id);
        inner.observers.len() != before
    }

    /// Deliver an event to every live observer.
    pub fn notify(&self, event: &TabEvent) {
        let observers: Vec<Arc<dyn TabObserver>> = {
            let mut inner = self.inner.lock();
            inner.observers.retain(|(_, weak)| weak.strong_count() > 0);
            inner
                .observers
                .iter()
                .filter_map(|(_, weak)| weak.upgrade())
                .collect()
        };
        for observer in observers {
            observer.on_tab_event(event);
        }
    }

    /// Number of registered (possibly dead, not yet pruned) observers.
    pub fn len(&self) -> usize {
        self.inner.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
