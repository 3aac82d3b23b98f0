//! Durable storage of the guest session.
//!
//! The session is kept as three string entries (`user_name`, `id`, `jwt_token`).
//! A session only exists when all three are present and non-empty; anything else,
//! including an unreadable backing file, reads as "no session".

use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use shared::domain::GuestId;
use tracing::{debug, warn};

use crate::error::StoreError;

pub const USER_NAME_KEY: &str = "user_name";
pub const GUEST_ID_KEY: &str = "id";
pub const TOKEN_KEY: &str = "jwt_token";

#[derive(Clone, PartialEq, Eq)]
pub struct GuestSession {
    pub user_name: String,
    pub guest_id: GuestId,
    pub auth_token: String,
}

impl fmt::Debug for GuestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestSession")
            .field("user_name", &self.user_name)
            .field("guest_id", &self.guest_id)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

impl GuestSession {
    pub fn from_entries(entries: &BTreeMap<String, String>) -> Option<Self> {
        let get = |key: &str| entries.get(key).filter(|v| !v.is_empty()).cloned();
        Some(Self {
            user_name: get(USER_NAME_KEY)?,
            guest_id: GuestId(get(GUEST_ID_KEY)?),
            auth_token: get(TOKEN_KEY)?,
        })
    }

    pub fn to_entries(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (USER_NAME_KEY.to_string(), self.user_name.clone()),
            (GUEST_ID_KEY.to_string(), self.guest_id.to_string()),
            (TOKEN_KEY.to_string(), self.auth_token.clone()),
        ])
    }
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<GuestSession>;
    /// Replaces any previously stored session.
    fn save(&self, session: &GuestSession) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Session kept in a JSON object on disk, surviving restarts.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<GuestSession> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "session: unreadable session file");
                return None;
            }
        };
        let entries: BTreeMap<String, String> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "session: malformed session file");
                return None;
            }
        };
        let session = GuestSession::from_entries(&entries);
        if session.is_none() {
            debug!(path = %self.path.display(), "session: incomplete entries treated as absent");
        }
        session
    }

    fn save(&self, session: &GuestSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let raw = serde_json::to_string_pretty(&session.to_entries())?;
        fs::write(&self.path, raw).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(self.io_error(error)),
        }
    }
}

/// Process-local store, used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds raw entries, which may describe an incomplete session.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn entries(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<GuestSession> {
        GuestSession::from_entries(&self.lock())
    }

    fn save(&self, session: &GuestSession) -> Result<(), StoreError> {
        let mut entries = self.lock();
        entries.extend(session.to_entries());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.lock();
        for key in [USER_NAME_KEY, GUEST_ID_KEY, TOKEN_KEY] {
            entries.remove(key);
        }
        Ok(())
    }
}

impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    fn load(&self) -> Option<GuestSession> {
        (**self).load()
    }

    fn save(&self, session: &GuestSession) -> Result<(), StoreError> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

#[cfg(test)]
#[path = "tests/session_store_tests.rs"]
mod tests;
