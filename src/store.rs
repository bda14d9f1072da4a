//! Durable key-value storage.
//!
//! One store holds several named collections of string-to-string entries;
//! the response cache keeps its entries in one collection, and external
//! schedulers can persist task or report queues in others.
//!
//! The provided [`JsonFileStore`] keeps the whole store in a single JSON
//! file, fully rewritten on every save via a temp-file-then-rename so the
//! file is never left half-written. There is no cross-process locking:
//! two processes saving into the same file concurrently is undefined
//! behavior, accepted as a known limitation of the single-user design.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};

type Collections = HashMap<String, HashMap<String, String>>;

/// Contract for durable named collections of string entries.
pub trait KvStore: Send + Sync {
    /// Load the named collection, empty if it has never been saved.
    fn load(&self, name: &str) -> Result<HashMap<String, String>>;

    /// Replace the named collection with `entries`.
    fn save(&self, name: &str, entries: &HashMap<String, String>) -> Result<()>;
}

/// A store backed by one JSON file holding every collection.
///
/// # Example
///
/// ```no_run
/// use std::collections::HashMap;
/// use promptgen::{JsonFileStore, KvStore};
///
/// let store = JsonFileStore::new("promptgen-store.json");
/// let mut responses = store.load("responses")?;
/// responses.insert("message".to_string(), "answer".to_string());
/// store.save("responses", &responses)?;
/// # Ok::<(), promptgen::Error>(())
/// ```
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store over the given file path. The file is created on
    /// first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_collections(&self) -> Result<Collections> {
        if !self.path.exists() {
            return Ok(Collections::new());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| {
            Error::CacheIo(format!("failed to read '{}': {e}", self.path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            Error::CacheIo(format!(
                "store file '{}' is corrupt: {e}",
                self.path.display()
            ))
        })
    }

    fn write_collections(&self, collections: &Collections) -> Result<()> {
        let text = serde_json::to_string_pretty(collections)?;
        atomic_write(&self.path, text.as_bytes())
    }
}

impl KvStore for JsonFileStore {
    fn load(&self, name: &str) -> Result<HashMap<String, String>> {
        let mut collections = self.read_collections()?;
        Ok(collections.remove(name).unwrap_or_default())
    }

    fn save(&self, name: &str, entries: &HashMap<String, String>) -> Result<()> {
        let mut collections = self.read_collections()?;
        collections.insert(name.to_string(), entries.clone());
        self.write_collections(&collections)
    }
}

/// Write bytes to `path` through a sibling temp file and an atomic rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::CacheIo(format!(
                    "failed to create directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::CacheIo(format!("invalid store path '{}'", path.display())))?;
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let mut file = File::create(&temp_path).map_err(|e| {
        Error::CacheIo(format!("failed to create '{}': {e}", temp_path.display()))
    })?;
    file.write_all(content)
        .and_then(|_| file.sync_all())
        .map_err(|e| Error::CacheIo(format!("failed to write '{}': {e}", temp_path.display())))?;

    fs::rename(&temp_path, path).map_err(|e| {
        Error::CacheIo(format!(
            "failed to replace '{}': {e}",
            path.display()
        ))
    })
}

/// An in-memory store for tests and cache-less runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn load(&self, name: &str) -> Result<HashMap<String, String>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.get(name).cloned().unwrap_or_default())
    }

    fn save(&self, name: &str, entries: &HashMap<String, String>) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        collections.insert(name.to_string(), entries.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        assert!(store.load("responses").unwrap().is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        let mut entries = HashMap::new();
        entries.insert("message".to_string(), "answer".to_string());
        store.save("responses", &entries).unwrap();

        assert_eq!(store.load("responses").unwrap(), entries);
    }

    #[test]
    fn collections_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        let mut responses = HashMap::new();
        responses.insert("m".to_string(), "r".to_string());
        store.save("responses", &responses).unwrap();

        let mut tasks = HashMap::new();
        tasks.insert("t1".to_string(), "{}".to_string());
        store.save("tasks", &tasks).unwrap();

        assert_eq!(store.load("responses").unwrap(), responses);
        assert_eq!(store.load("tasks").unwrap(), tasks);
    }

    #[test]
    fn persists_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut entries = HashMap::new();
        entries.insert("k".to_string(), "v".to_string());
        JsonFileStore::new(&path).save("responses", &entries).unwrap();

        assert_eq!(JsonFileStore::new(&path).load("responses").unwrap(), entries);
    }

    #[test]
    fn corrupt_file_is_a_fatal_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::new(&path).load("responses").unwrap_err();
        assert!(matches!(err, Error::CacheIo(_)));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        let mut entries = HashMap::new();
        entries.insert("k".to_string(), "v".to_string());
        store.save("responses", &entries).unwrap();
        assert_eq!(store.load("responses").unwrap(), entries);
        assert!(store.load("other").unwrap().is_empty());
    }
}
