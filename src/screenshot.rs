//! Tab screenshot storage.
//!
//! Screenshots are derived data: losing one costs a placeholder thumbnail
//! until the next capture, nothing more. They live as individual PNG files
//! under the configured screenshot directory, fronted by a small in-memory
//! LRU so the tab switcher does not hit disk for every thumbnail.

use crate::error::StoreError;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct ScreenshotStore {
    dir: PathBuf,
    cache: Option<Mutex<LruCache<Uuid, Vec<u8>>>>,
}

impl ScreenshotStore {
    /// `cache_entries` of zero disables the in-memory layer; files are still
    /// written and read.
    pub fn new(dir: PathBuf, cache_entries: usize) -> Self {
        let cache = NonZeroUsize::new(cache_entries).map(|n| Mutex::new(LruCache::new(n)));
        Self { dir, cache }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.png"))
    }

    /// Store captured image bytes and return the id a tab can hold on to.
    pub fn put(&self, bytes: Vec<u8>) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let path = self.path_for(id);
        std::fs::write(&path, &bytes).map_err(|e| StoreError::io(&path, e))?;
        if let Some(cache) = &self.cache {
            cache.lock().put(id, bytes);
        }
        Ok(id)
    }

    /// Fetch image bytes, preferring the cache. Missing files are `None`,
    /// not an error: a pruned or never-written screenshot is a normal state.
    pub fn get(&self, id: Uuid) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(cache) = &self.cache
            && let Some(bytes) = cache.lock().get(&id)
        {
            return Ok(Some(bytes.clone()));
        }
        let path = self.path_for(id);
        match std::fs::read(&path) {
            Ok(bytes) => {
                if let Some(cache) = &self.cache {
                    cache.lock().put(id, bytes.clone());
                }
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Delete one screenshot. Deleting a missing file succeeds.
    pub fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(cache) = &self.cache {
            cache.lock().pop(&id);
        }
        let path = self.path_for(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Delete every stored screenshot whose id is not in `live`. Returns how
    /// many files were removed. Files that are not `<uuid>.png` are left
    /// alone.
    pub fn prune(&self, live: &HashSet<Uuid>) -> Result<usize, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = entry.path();
            let Some(id) = stored_id(&path) else {
                continue;
            };
            if live.contains(&id) {
                continue;
            }
            self.remove(id)?;
            removed += 1;
        }
        if removed > 0 {
            log::debug!("Pruned {removed} orphaned screenshot(s)");
        }
        Ok(removed)
    }
}

fn stored_id(path: &Path) -> Option<Uuid> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    Uuid::parse_str(path.file_stem()?.to_str()?).ok()
}
