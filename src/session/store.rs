//! Durable key-value storage for the session mirror.
//!
//! SYSTEM CONTEXT
//! ==============
//! The credential store is what lets a session survive a reload. It holds
//! four string entries written together on login and removed together on
//! logout. Hydration treats anything short of all four as "no session".
//!
//! TRADE-OFFS
//! ==========
//! Persistence is best-effort. A store that cannot be read or written costs
//! the user a re-login, never a crash.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{Role, Session};

pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";
pub const ROLE_KEY: &str = "role";
pub const EMAIL_KEY: &str = "useremail";

/// Every key a session occupies, in write order.
pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, USERNAME_KEY, ROLE_KEY, EMAIL_KEY];

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("browser storage unavailable")]
    Unavailable,

    #[error("browser storage rejected {op} of `{key}`")]
    Rejected { op: &'static str, key: String },
}

// =============================================================================
// TRAIT
// =============================================================================

/// String-keyed storage that outlives the process (or page).
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// SESSION MAPPING
// =============================================================================

/// Read a complete session, or `None` if any entry is missing or invalid.
///
/// An empty token counts as missing. Empty username or email are kept, so
/// whatever `save_session` wrote reads back unchanged.
pub fn load_session(store: &dyn CredentialStore) -> Option<Session> {
    let read = |key: &str| match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "credential store read failed");
            None
        }
    };

    let token = read(TOKEN_KEY).filter(|t| !t.is_empty())?;
    let username = read(USERNAME_KEY)?;
    let role_raw = read(ROLE_KEY)?;
    let email = read(EMAIL_KEY)?;

    let role = match role_raw.parse::<Role>() {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!(error = %e, "stored session has an invalid role; ignoring it");
            return None;
        }
    };

    Some(Session { token, username, role, email })
}

/// Write all four entries. On failure the entries are erased again so the
/// store never holds a half-written session.
pub fn save_session(store: &dyn CredentialStore, session: &Session) -> Result<(), StoreError> {
    let entries = [
        (TOKEN_KEY, session.token.as_str()),
        (USERNAME_KEY, session.username.as_str()),
        (ROLE_KEY, session.role.as_str()),
        (EMAIL_KEY, session.email.as_str()),
    ];
    for (key, value) in entries {
        if let Err(e) = store.set(key, value) {
            if let Err(rollback) = erase_session(store) {
                tracing::warn!(error = %rollback, "failed to roll back partial session write");
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Remove all four entries, attempting every key even if one fails.
pub fn erase_session(store: &dyn CredentialStore) -> Result<(), StoreError> {
    let mut first_err = None;
    for key in SESSION_KEYS {
        if let Err(e) = store.remove(key) {
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), Err)
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store. Nothing survives a restart; useful for tests and
/// embedders that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON object on disk, one entry per key. Writes go through a temp file and
/// a rename so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Store at `<dir>/session.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("session.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>) -> bool) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        if apply(&mut entries) {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

// =============================================================================
// BROWSER STORE
// =============================================================================

/// `window.localStorage`, the store a browser build persists into.
#[cfg(feature = "hydrate")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(feature = "hydrate")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StoreError::Unavailable)
    }
}

#[cfg(feature = "hydrate")]
impl CredentialStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| StoreError::Rejected { op: "read", key: key.to_owned() })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|_| StoreError::Rejected { op: "write", key: key.to_owned() })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|_| StoreError::Rejected { op: "removal", key: key.to_owned() })
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
