use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Key-value store for serialized workspace trees, one entry per workspace.
///
/// The VFS accesses it read-modify-write with no isolation, so concurrent
/// writers to the same workspace can clobber each other. `compare_and_swap`
/// exists so a versioned store can be introduced without touching call sites.
pub trait WorkspaceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: String) -> Result<()>;
    /// Store `value` only if the current entry equals `expected`.
    /// Returns whether the swap happened.
    fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: String) -> Result<bool>;
}

/// Stores each workspace tree as one JSON file under a root directory.
pub struct FileStore {
    root_dir: PathBuf,
}

impl FileStore {
    pub fn new(root_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // Workspace ids come from the application, but keep the file name safe
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            })
            .collect();
        self.root_dir.join(format!("{}.json", safe))
    }
}

impl WorkspaceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        debug!("Loading workspace state from {}", path.display());
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.entry_path(key);
        debug!("Saving workspace state to {}", path.display());
        std::fs::write(path, value)?;
        Ok(())
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: String) -> Result<bool> {
        if self.get(key)?.as_deref() != expected {
            return Ok(false);
        }
        self.set(key, value)?;
        Ok(true)
    }
}

/// In-memory store, shared between clones. Used in tests and by embedders
/// that do not want on-disk persistence.
#[derive(Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkspaceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: String) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        if entries.get(key).map(|s| s.as_str()) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), value);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileStore::new(dir.path().to_path_buf())?;
        assert_eq!(store.get("ws-1")?, None);
        store.set("ws-1", "{}".to_string())?;
        assert_eq!(store.get("ws-1")?.as_deref(), Some("{}"));
        Ok(())
    }

    #[test]
    fn test_file_store_sanitizes_keys() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileStore::new(dir.path().to_path_buf())?;
        store.set("../evil/../key", "x".to_string())?;
        assert_eq!(store.get("../evil/../key")?.as_deref(), Some("x"));
        // Nothing escaped the root directory
        assert!(!dir.path().parent().unwrap().join("evil").exists());
        Ok(())
    }

    #[test]
    fn test_compare_and_swap() -> Result<()> {
        let store = MemoryStore::new();
        assert!(store.compare_and_swap("k", None, "a".to_string())?);
        assert!(!store.compare_and_swap("k", None, "b".to_string())?);
        assert!(store.compare_and_swap("k", Some("a"), "b".to_string())?);
        assert_eq!(store.get("k")?.as_deref(), Some("b"));
        Ok(())
    }
}
