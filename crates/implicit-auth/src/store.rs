//! Persistent key-value storage for session state
//!
//! The session keeps its state value and token material in a string-keyed,
//! string-valued store that outlives a single page load. Two implementations
//! ship here: an in-memory map for tests and embedding, and a JSON file for
//! hosts without browser storage. Both serialize access with a mutex, so one
//! store can be shared by several sessions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// String key-value store that survives page reloads.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

fn lock(state: &Mutex<HashMap<String, String>>) -> MutexGuard<'_, HashMap<String, String>> {
    // A poisoned map is still a valid map; keep serving it.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory store. Contents live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        lock(&self.state).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.state).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.state).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.state).remove(key);
        Ok(())
    }
}

/// JSON-file store.
///
/// The file holds a flat object of string pairs. Every mutation rewrites the
/// whole file via temp file + rename, with 0600 permissions since it holds
/// access tokens.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty `{}` file if it is missing.
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::Storage(format!("reading store file: {e}")))?;
            let entries: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Storage(format!("parsing store file: {e}")))?;
            info!(path = %path.display(), entries = entries.len(), "loaded session store");
            entries
        } else {
            info!(path = %path.display(), "store file not found, starting empty");
            let entries = HashMap::new();
            write_atomic(&path, &entries)?;
            entries
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.state).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.insert(key.to_owned(), value.to_owned());
        debug!(key, "stored entry");
        write_atomic(&self.path, &state)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut state = lock(&self.state);
        if state.remove(key).is_some() {
            debug!(key, "removed entry");
            write_atomic(&self.path, &state)?;
        }
        Ok(())
    }
}

/// Write the map to `path` through a sibling temp file and a rename.
fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Storage(format!("serializing store: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage("store path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".igca-store.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Storage(format!("writing temp store file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)
            .map_err(|e| Error::Storage(format!("setting store file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Storage(format!("renaming temp store file: {e}")))?;

    debug!(path = %path.display(), "persisted session store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get("k").is_none());

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));

        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        assert!(store.get("k").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_remove_missing_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove("missing").is_ok());
    }

    #[test]
    fn file_store_cold_start_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        assert!(!path.exists());
        let store = FileStore::open(path.clone()).unwrap();
        assert!(path.exists());
        assert!(store.get("anything").is_none());

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(path.clone()).unwrap();
        store.set("igca_state_key", "ABCDEFGHIJKLMNOP").unwrap();
        store.set("igca_access_token", "at_1").unwrap();
        store.remove("igca_access_token").unwrap();

        let reopened = FileStore::open(path).unwrap();
        assert_eq!(
            reopened.get("igca_state_key").as_deref(),
            Some("ABCDEFGHIJKLMNOP")
        );
        assert!(reopened.get("igca_access_token").is_none());
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json {{").unwrap();

        let result = FileStore::open(path);
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open(path.clone()).unwrap();
        store.set("igca_access_token", "at_1").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "store file must be 0600, got {mode:o}");
    }
}
