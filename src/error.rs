//! Typed errors for the session and screenshot stores.
//!
//! Callers in the tab layer treat these as recoverable: failures are logged
//! and the operation degrades (a failed session write keeps the previous
//! snapshot on disk, a failed screenshot read falls back to no thumbnail).
//! The variants exist so tooling and tests can match on failure modes.

use thiserror::Error;

/// Errors produced by [`crate::session::SessionStore`] and
/// [`crate::screenshot::ScreenshotStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    // ------------------------------------------------------------------
    // I/O
    // ------------------------------------------------------------------
    /// Reading, writing, or renaming a store file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation touched.
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------
    /// A session file on disk is not valid JSON for the current schema.
    #[error("failed to parse session file {path}: {source}")]
    Parse {
        /// Path of the unreadable file.
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Session state could not be serialized.
    #[error("failed to serialize session state: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    /// Attach a path to an I/O error.
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
