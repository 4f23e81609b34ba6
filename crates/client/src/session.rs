//! Persistence of the logged-in user between runs.
//!
//! The session is a single serialized [`UserRecord`] stored under the key
//! [`SESSION_KEY`]. It has no schema versioning: a record that no longer
//! decodes is reported as [`SessionError::Corrupt`] and the caller decides
//! whether to discard it.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

use crate::models::UserRecord;

/// Key under which the session record is stored.
pub const SESSION_KEY: &str = "logged_in_user";

/// Errors from the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Io(#[from] io::Error),

    #[error("stored session is unreadable: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to encode session: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Key-value storage for the current session.
pub trait SessionStore: fmt::Debug + Send + Sync {
    /// The stored user, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Corrupt`] if a record exists but does not
    /// decode, or [`SessionError::Io`] if storage cannot be read.
    fn load(&self) -> Result<Option<UserRecord>, SessionError>;

    /// Replace the stored user.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    fn save(&self, user: &UserRecord) -> Result<(), SessionError>;

    /// Remove the stored user. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if storage cannot be written.
    fn clear(&self) -> Result<(), SessionError>;
}

// =============================================================================
// FileSessionStore
// =============================================================================

/// Stores the session as `<dir>/logged_in_user.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
    path: PathBuf,
}

impl FileSessionStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(format!("{SESSION_KEY}.json"));
        Self { dir, path }
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<UserRecord>, SessionError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(SessionError::Corrupt)
    }

    fn save(&self, user: &UserRecord) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec_pretty(user).map_err(SessionError::Encode)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write beside the target, then rename over it.
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), user_id = %user.id, "Saved session");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared session");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// MemorySessionStore
// =============================================================================

/// In-process store holding the serialized record, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    blob: Mutex<Option<Vec<u8>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw bytes, e.g. a record from an older build.
    #[must_use]
    pub fn with_raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: Mutex::new(Some(bytes.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
        // Writes replace the whole blob, so a poisoned lock holds no partial state.
        self.blob
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<UserRecord>, SessionError> {
        self.slot()
            .as_deref()
            .map(|bytes| serde_json::from_slice::<UserRecord>(bytes))
            .transpose()
            .map_err(SessionError::Corrupt)
    }

    fn save(&self, user: &UserRecord) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec(user).map_err(SessionError::Encode)?;
        *self.slot() = Some(bytes);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot() = None;
        Ok(())
    }
}
