//! Background session writer.

use super::{SessionState, storage::SessionStore};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Last-writer-wins session persistence.
///
/// Snapshots are cheap to build but writes hit disk, so the manager hands
/// completed [`SessionState`] values here and carries on. Each snapshot gets
/// a generation number; writes serialize on a lock, and a task holding a
/// snapshot older than the last one written drops it instead of clobbering
/// the newer file. Write failures are logged and swallowed: the previous
/// on-disk snapshot stays in place and browsing is never interrupted.
pub struct Persister {
    store: Arc<SessionStore>,
    handle: tokio::runtime::Handle,
    next_generation: AtomicU64,
    last_written: Arc<Mutex<u64>>,
}

impl Persister {
    pub fn new(store: SessionStore, handle: tokio::runtime::Handle) -> Self {
        Self {
            store: Arc::new(store),
            handle,
            next_generation: AtomicU64::new(0),
            last_written: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue a snapshot for a background write and return immediately.
    pub fn spawn_save(&self, state: SessionState) {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let store = Arc::clone(&self.store);
        let last_written = Arc::clone(&self.last_written);

        self.handle.spawn_blocking(move || {
            let mut last = last_written.lock();
            if generation <= *last {
                log::debug!("Session save generation {generation} superseded, skipping write");
                return;
            }
            match store.save(&state, false) {
                Ok(()) => *last = generation,
                Err(e) => log::error!("Failed to save session state: {e}"),
            }
        });
    }

    /// Write a snapshot on the caller's thread. Shutdown path, where queueing
    /// a background task would race process exit.
    pub fn save_now(&self, state: &SessionState) {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut last = self.last_written.lock();
        if generation <= *last {
            return;
        }
        match self.store.save(state, false) {
            Ok(()) => *last = generation,
            Err(e) => log::error!("Failed to save session state: {e}"),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
