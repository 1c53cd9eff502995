use super::*;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("coursegate-store-{}", uuid::Uuid::new_v4()))
}

fn bob() -> Session {
    Session {
        token: "T2".to_owned(),
        username: "Bob".to_owned(),
        role: Role::Teacher,
        email: "b@x.com".to_owned(),
    }
}

/// Accepts the first `budget` writes, then rejects.
struct FlakyStore {
    inner: MemoryStore,
    budget: Mutex<usize>,
}

impl CredentialStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut budget = self.budget.lock().unwrap();
        if *budget == 0 {
            return Err(StoreError::Unavailable);
        }
        *budget -= 1;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[test]
fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("token").unwrap(), None);
    store.set("token", "abc").unwrap();
    assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
    store.remove("token").unwrap();
    assert_eq!(store.get("token").unwrap(), None);
    store.remove("token").unwrap();
}

// =============================================================================
// FILE STORE
// =============================================================================

#[test]
fn file_store_missing_file_reads_empty() {
    let store = FileStore::in_dir(temp_dir());
    assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    store.remove(TOKEN_KEY).unwrap();
    assert!(!store.path().exists());
}

#[test]
fn file_store_persists_across_instances() {
    let dir = temp_dir();
    FileStore::in_dir(&dir).set(TOKEN_KEY, "abc").unwrap();

    let reopened = FileStore::in_dir(&dir);
    assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn file_store_remove_keeps_other_entries() {
    let dir = temp_dir();
    let store = FileStore::in_dir(&dir);
    store.set(TOKEN_KEY, "abc").unwrap();
    store.set(EMAIL_KEY, "a@x.com").unwrap();
    store.remove(TOKEN_KEY).unwrap();

    assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(store.get(EMAIL_KEY).unwrap().as_deref(), Some("a@x.com"));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn file_store_corrupt_file_errors_and_hydrates_anonymous() {
    let dir = temp_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let store = FileStore::in_dir(&dir);
    std::fs::write(store.path(), "{not json").unwrap();

    assert!(matches!(store.get(TOKEN_KEY), Err(StoreError::Corrupt(_))));
    assert_eq!(load_session(&store), None);

    std::fs::remove_dir_all(dir).unwrap();
}

// =============================================================================
// SESSION MAPPING
// =============================================================================

#[test]
fn save_then_load_round_trips_through_file() {
    let dir = temp_dir();
    save_session(&FileStore::in_dir(&dir), &bob()).unwrap();
    assert_eq!(load_session(&FileStore::in_dir(&dir)), Some(bob()));
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn save_writes_the_wire_keys() {
    let store = MemoryStore::new();
    save_session(&store, &bob()).unwrap();
    assert_eq!(store.get("token").unwrap().as_deref(), Some("T2"));
    assert_eq!(store.get("username").unwrap().as_deref(), Some("Bob"));
    assert_eq!(store.get("role").unwrap().as_deref(), Some("teacher"));
    assert_eq!(store.get("useremail").unwrap().as_deref(), Some("b@x.com"));
    assert_eq!(store.len(), 4);
}

#[test]
fn failed_save_leaves_no_partial_session() {
    let store = FlakyStore { inner: MemoryStore::new(), budget: Mutex::new(2) };
    assert!(save_session(&store, &bob()).is_err());
    assert!(store.inner.is_empty());
    assert_eq!(load_session(&store), None);
}

#[test]
fn erase_removes_only_session_keys() {
    let store = MemoryStore::new();
    save_session(&store, &bob()).unwrap();
    store.set("theme", "dark").unwrap();
    erase_session(&store).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
}

#[test]
fn empty_username_and_email_round_trip() {
    let store = MemoryStore::new();
    let session = Session { username: String::new(), email: String::new(), ..bob() };
    save_session(&store, &session).unwrap();
    assert_eq!(load_session(&store), Some(session));
}

#[test]
fn empty_token_loads_as_anonymous() {
    let store = MemoryStore::new();
    save_session(&store, &Session { token: String::new(), ..bob() }).unwrap();
    assert_eq!(load_session(&store), None);
}

/// Rejects every write and every removal.
struct ReadOnlyStore {
    inner: MemoryStore,
}

impl CredentialStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Rejected { op: "write", key: key.to_owned() })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Err(StoreError::Rejected { op: "removal", key: key.to_owned() })
    }
}

#[test]
fn failed_rollback_still_reports_the_write_error() {
    let store = ReadOnlyStore { inner: MemoryStore::new() };
    let err = save_session(&store, &bob()).unwrap_err();
    assert!(matches!(err, StoreError::Rejected { op: "write", ref key } if key == TOKEN_KEY), "{err:?}");
}
