// "Already notified" bookkeeping
//
// Keys are opaque strings chosen by the notifier (`<rev>`, `<rev>-try`,
// `breakage-<builder>`). An entry is created by `mark_notified`, removed
// by `clear`, and dropped by `prune` once older than the given age.

use crate::persist::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from a persistent notification store
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for notification store operations
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Records which notifications were already sent
pub trait NotificationStore {
    fn has_notified(&self, key: &str) -> Result<bool>;

    /// Record `key` as notified at `now` (Unix seconds)
    fn mark_notified(&mut self, key: &str, now: u64) -> Result<()>;

    /// Forget `key`; no-op when absent
    fn clear(&mut self, key: &str) -> Result<()>;

    /// Drop entries marked before `now - max_age`; returns how many
    fn prune(&mut self, now: u64, max_age: u64) -> Result<usize>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
struct Entries(BTreeMap<String, u64>);

impl Entries {
    fn prune(&mut self, now: u64, max_age: u64) -> usize {
        let cutoff = now.saturating_sub(max_age);
        let before = self.0.len();
        self.0.retain(|_, marked_at| *marked_at >= cutoff);
        before - self.0.len()
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    entries: Entries,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationStore for MemoryNotificationStore {
    fn has_notified(&self, key: &str) -> Result<bool> {
        Ok(self.entries.0.contains_key(key))
    }

    fn mark_notified(&mut self, key: &str, now: u64) -> Result<()> {
        self.entries.0.insert(key.to_string(), now);
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        self.entries.0.remove(key);
        Ok(())
    }

    fn prune(&mut self, now: u64, max_age: u64) -> Result<usize> {
        Ok(self.entries.prune(now, max_age))
    }
}

/// Store kept as one JSON object (`key -> marked-at`) in a file
///
/// The file is re-read on every query and rewritten on every change, so
/// separate processes observe each other's marks.
#[derive(Debug, Clone)]
pub struct FileNotificationStore {
    path: PathBuf,
}

impl FileNotificationStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Entries> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Entries::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }
}

impl NotificationStore for FileNotificationStore {
    fn has_notified(&self, key: &str) -> Result<bool> {
        Ok(self.read()?.0.contains_key(key))
    }

    fn mark_notified(&mut self, key: &str, now: u64) -> Result<()> {
        let mut entries = self.read()?;
        entries.0.insert(key.to_string(), now);
        self.write(&entries)
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read()?;
        if entries.0.remove(key).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }

    fn prune(&mut self, now: u64, max_age: u64) -> Result<usize> {
        let mut entries = self.read()?;
        let removed = entries.prune(now, max_age);
        if removed > 0 {
            self.write(&entries)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<S: NotificationStore>(store: &mut S) {
        assert!(!store.has_notified("abc123").unwrap());
        store.mark_notified("abc123", 1_000).unwrap();
        assert!(store.has_notified("abc123").unwrap());
        assert!(!store.has_notified("abc123-try").unwrap());

        store.clear("abc123").unwrap();
        assert!(!store.has_notified("abc123").unwrap());
        store.clear("never-marked").unwrap();
    }

    #[test]
    fn test_memory_store() {
        exercise(&mut MemoryNotificationStore::new());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&mut FileNotificationStore::new(dir.path().join("notified.json")));
    }

    #[test]
    fn test_file_store_shared_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("notified.json");
        let mut writer = FileNotificationStore::new(&path);
        writer.mark_notified("breakage-gcc-x86_64", 5).unwrap();

        let reader = FileNotificationStore::new(&path);
        assert!(reader.has_notified("breakage-gcc-x86_64").unwrap());
    }

    #[test]
    fn test_prune_drops_old_entries() {
        let mut store = MemoryNotificationStore::new();
        store.mark_notified("old", 100).unwrap();
        store.mark_notified("new", 900).unwrap();

        assert_eq!(store.prune(1_000, 500).unwrap(), 1);
        assert!(!store.has_notified("old").unwrap());
        assert!(store.has_notified("new").unwrap());
    }

    #[test]
    fn test_file_prune() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileNotificationStore::new(dir.path().join("n.json"));
        store.mark_notified("a", 10).unwrap();
        store.mark_notified("b", 20).unwrap();

        assert_eq!(store.prune(25, 10).unwrap(), 1);
        assert!(store.has_notified("b").unwrap());
        assert_eq!(store.prune(25, 10).unwrap(), 0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileNotificationStore::new(&path).has_notified("x").is_err());
    }
}
