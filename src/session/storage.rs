//! Session file persistence.

use super::SessionState;
use crate::error::StoreError;
use std::fs;
use std::path::PathBuf;

/// On-disk session store: one JSON file per partition under the data
/// directory.
///
/// Only the normal partition is auto-persisted by the manager; the incognito
/// file name exists for tooling and tests. Writes are atomic (tmp file plus
/// rename) so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// File path for a partition's session.
    pub fn path_for(&self, incognito: bool) -> PathBuf {
        let name = if incognito {
            "session_incognito.json"
        } else {
            "session_normal.json"
        };
        self.dir.join(name)
    }

    /// Write a session snapshot.
    pub fn save(&self, state: &SessionState, incognito: bool) -> Result<(), StoreError> {
        let path = self.path_for(incognito);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(state).map_err(StoreError::Serialize)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &json).map_err(|e| StoreError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| StoreError::io(&path, e))?;

        log::info!(
            "Saved session state ({} tabs) to {:?}",
            state.tabs.len(),
            path
        );
        Ok(())
    }

    /// Load a partition's session.
    ///
    /// Missing or empty files are a normal first-run condition and yield
    /// Ok(None). A file that exists but cannot be parsed is an error; the
    /// manager logs it and starts fresh rather than aborting.
    pub fn load(&self, incognito: bool) -> Result<Option<SessionState>, StoreError> {
        let path = self.path_for(incognito);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        if contents.trim().is_empty() {
            log::warn!("Session file {:?} is empty, ignoring", path);
            return Ok(None);
        }

        let state: SessionState =
            serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;

        log::info!(
            "Loaded session state ({} tabs, saved at {})",
            state.tabs.len(),
            state.saved_at
        );
        Ok(Some(state))
    }

    /// Delete a partition's session file. A missing file is not an error.
    pub fn clear(&self, incognito: bool) -> Result<(), StoreError> {
        let path = self.path_for(incognito);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
            log::info!("Cleared session file {:?}", path);
        }
        Ok(())
    }
}
