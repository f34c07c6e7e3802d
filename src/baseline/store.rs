//! Persistent storage for baselines and recorded runs
//!
//! Everything is keyed by (builder, branch). The file-backed store lays a
//! key out as:
//!
//! ```text
//! <root>/<builder>/<branch>/
//!     baseline.json      last known good run
//!     .last-commit       commit the baseline was recorded at
//!     previous.json      most recent regular run
//!     prior.json         the run before `previous.json`
//!     xfail              XFAIL ignore list (maintained by hand)
//!     try/<commit>.json  try-build runs
//! ```
//!
//! `%`, `/` and `\` in builder and branch names are percent-encoded so each
//! name stays one directory. Records carry a SHA-256 fingerprint of their results, checked on load.

use crate::persist::write_atomic;
use crate::regression::XfailList;
use crate::sumfile::ResultSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Branch used when the build master reports none
pub const DEFAULT_BRANCH: &str = "master";

/// Errors that can occur while reading or writing the store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid store key component: {0:?}")]
    InvalidKey(String),

    #[error("Corrupt record at {location}: fingerprint {found} does not match {expected}")]
    Corrupt {
        location: String,
        expected: String,
        found: String,
    },

    #[error("Failed to read XFAIL list: {0}")]
    Xfail(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// (builder, branch) pair identifying one baseline
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    builder: String,
    branch: String,
}

impl StoreKey {
    /// Build a key; a missing branch means `master`
    ///
    /// Names are trimmed; empty names and `.`/`..` are rejected.
    pub fn new(builder: &str, branch: Option<&str>) -> Result<Self> {
        Ok(Self {
            builder: checked_name(builder)?,
            branch: checked_name(branch.unwrap_or(DEFAULT_BRANCH))?,
        })
    }

    pub fn builder(&self) -> &str {
        &self.builder
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.builder, self.branch)
    }
}

fn checked_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(StoreError::InvalidKey(name.to_string()));
    }
    Ok(name.to_string())
}

/// Encode a checked name as one path component
///
/// `%` and both path separators are percent-encoded, so distinct names
/// always map to distinct directories (`releases/gcc-14` becomes
/// `releases%2Fgcc-14`, `releases_gcc-14` is left alone).
fn path_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            c => out.push(c),
        }
    }
    out
}

/// A run as persisted: its results plus provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRun {
    pub builder: String,
    pub branch: String,
    /// Commit the run tested
    pub commit: String,
    /// Unix seconds at which the run was recorded
    pub recorded_at: u64,
    /// SHA-256 of the canonical rendering of `results`
    pub fingerprint: String,
    pub results: ResultSet,
}

impl StoredRun {
    /// Wrap results for storage, stamping fingerprint and time
    pub fn new(key: &StoreKey, commit: &str, results: ResultSet) -> Self {
        Self {
            builder: key.builder().to_string(),
            branch: key.branch().to_string(),
            commit: commit.to_string(),
            recorded_at: unix_timestamp(),
            fingerprint: results.fingerprint(),
            results,
        }
    }

    /// Check the stored fingerprint against the results
    pub fn verify(&self, location: &str) -> Result<()> {
        let found = self.results.fingerprint();
        if found != self.fingerprint {
            return Err(StoreError::Corrupt {
                location: location.to_string(),
                expected: self.fingerprint.clone(),
                found,
            });
        }
        Ok(())
    }
}

fn unix_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Which recorded regular run to address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunSlot {
    /// The most recent regular run
    Previous,
    /// The run before `Previous`
    Prior,
}

impl RunSlot {
    fn file_name(&self) -> &'static str {
        match self {
            RunSlot::Previous => "previous.json",
            RunSlot::Prior => "prior.json",
        }
    }
}

/// Storage backend for baselines and recorded runs
///
/// Callers guarantee at most one writer per key at a time.
pub trait BaselineStore {
    fn load_baseline(&self, key: &StoreKey) -> Result<Option<StoredRun>>;

    /// Replace the baseline and update the last-commit marker
    fn save_baseline(&mut self, key: &StoreKey, run: &StoredRun) -> Result<()>;

    fn load_run(&self, key: &StoreKey, slot: RunSlot) -> Result<Option<StoredRun>>;

    fn save_run(&mut self, key: &StoreKey, slot: RunSlot, run: &StoredRun) -> Result<()>;

    /// Move `Previous` into `Prior`; no-op when there is no previous run
    fn rotate_previous(&mut self, key: &StoreKey) -> Result<()>;

    /// Record a try-build run under its commit
    fn save_try_run(&mut self, key: &StoreKey, run: &StoredRun) -> Result<()>;

    fn load_try_run(&self, key: &StoreKey, commit: &str) -> Result<Option<StoredRun>>;

    /// XFAIL ignore list for the key; empty when none is configured
    fn load_xfails(&self, key: &StoreKey) -> Result<XfailList>;

    /// Commit the current baseline was recorded at
    fn last_commit(&self, key: &StoreKey) -> Result<Option<String>>;
}

/// Store rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct FileBaselineStore {
    root: PathBuf,
}

impl FileBaselineStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything for one key
    pub fn key_dir(&self, key: &StoreKey) -> PathBuf {
        self.root
            .join(path_component(key.builder()))
            .join(path_component(key.branch()))
    }

    fn last_commit_path(&self, key: &StoreKey) -> PathBuf {
        self.key_dir(key).join(".last-commit")
    }

    fn try_path(&self, key: &StoreKey, commit: &str) -> Result<PathBuf> {
        let name = format!("{}.json", path_component(&checked_name(commit)?));
        Ok(self.key_dir(key).join("try").join(name))
    }

    fn read_run(path: &Path) -> Result<Option<StoredRun>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let run: StoredRun = serde_json::from_str(&text)?;
        if let Err(e) = run.verify(&path.display().to_string()) {
            tracing::warn!("{}", e);
            return Err(e);
        }
        Ok(Some(run))
    }

    fn write_run(path: &Path, run: &StoredRun) -> Result<()> {
        let json = serde_json::to_string_pretty(run)?;
        write_atomic(path, json.as_bytes())?;
        Ok(())
    }
}

impl BaselineStore for FileBaselineStore {
    fn load_baseline(&self, key: &StoreKey) -> Result<Option<StoredRun>> {
        Self::read_run(&self.key_dir(key).join("baseline.json"))
    }

    fn save_baseline(&mut self, key: &StoreKey, run: &StoredRun) -> Result<()> {
        Self::write_run(&self.key_dir(key).join("baseline.json"), run)?;
        write_atomic(
            &self.last_commit_path(key),
            format!("{}\n", run.commit).as_bytes(),
        )?;
        Ok(())
    }

    fn load_run(&self, key: &StoreKey, slot: RunSlot) -> Result<Option<StoredRun>> {
        Self::read_run(&self.key_dir(key).join(slot.file_name()))
    }

    fn save_run(&mut self, key: &StoreKey, slot: RunSlot, run: &StoredRun) -> Result<()> {
        Self::write_run(&self.key_dir(key).join(slot.file_name()), run)
    }

    fn rotate_previous(&mut self, key: &StoreKey) -> Result<()> {
        let dir = self.key_dir(key);
        let previous = dir.join(RunSlot::Previous.file_name());
        match std::fs::rename(&previous, dir.join(RunSlot::Prior.file_name())) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_try_run(&mut self, key: &StoreKey, run: &StoredRun) -> Result<()> {
        let path = self.try_path(key, &run.commit)?;
        Self::write_run(&path, run)
    }

    fn load_try_run(&self, key: &StoreKey, commit: &str) -> Result<Option<StoredRun>> {
        Self::read_run(&self.try_path(key, commit)?)
    }

    fn load_xfails(&self, key: &StoreKey) -> Result<XfailList> {
        XfailList::from_file(self.key_dir(key).join("xfail"))
            .map_err(|e| StoreError::Xfail(format!("{:#}", e)))
    }

    fn last_commit(&self, key: &StoreKey) -> Result<Option<String>> {
        match std::fs::read_to_string(self.last_commit_path(key)) {
            Ok(text) => {
                let commit = text.trim();
                Ok((!commit.is_empty()).then(|| commit.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryEntry {
    baseline: Option<StoredRun>,
    previous: Option<StoredRun>,
    prior: Option<StoredRun>,
    tries: BTreeMap<String, StoredRun>,
    xfails: XfailList,
}

/// In-memory store, for tests and for hosts that persist elsewhere
#[derive(Debug, Clone, Default)]
pub struct MemoryBaselineStore {
    entries: HashMap<StoreKey, MemoryEntry>,
}

impl MemoryBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an XFAIL ignore list for a key
    pub fn set_xfails(&mut self, key: &StoreKey, xfails: XfailList) {
        self.entries.entry(key.clone()).or_default().xfails = xfails;
    }

    fn entry(&self, key: &StoreKey) -> Option<&MemoryEntry> {
        self.entries.get(key)
    }

    fn entry_mut(&mut self, key: &StoreKey) -> &mut MemoryEntry {
        self.entries.entry(key.clone()).or_default()
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn load_baseline(&self, key: &StoreKey) -> Result<Option<StoredRun>> {
        Ok(self.entry(key).and_then(|e| e.baseline.clone()))
    }

    fn save_baseline(&mut self, key: &StoreKey, run: &StoredRun) -> Result<()> {
        self.entry_mut(key).baseline = Some(run.clone());
        Ok(())
    }

    fn load_run(&self, key: &StoreKey, slot: RunSlot) -> Result<Option<StoredRun>> {
        Ok(self.entry(key).and_then(|e| match slot {
            RunSlot::Previous => e.previous.clone(),
            RunSlot::Prior => e.prior.clone(),
        }))
    }

    fn save_run(&mut self, key: &StoreKey, slot: RunSlot, run: &StoredRun) -> Result<()> {
        let entry = self.entry_mut(key);
        match slot {
            RunSlot::Previous => entry.previous = Some(run.clone()),
            RunSlot::Prior => entry.prior = Some(run.clone()),
        }
        Ok(())
    }

    fn rotate_previous(&mut self, key: &StoreKey) -> Result<()> {
        let entry = self.entry_mut(key);
        if let Some(previous) = entry.previous.take() {
            entry.prior = Some(previous);
        }
        Ok(())
    }

    fn save_try_run(&mut self, key: &StoreKey, run: &StoredRun) -> Result<()> {
        self.entry_mut(key)
            .tries
            .insert(run.commit.clone(), run.clone());
        Ok(())
    }

    fn load_try_run(&self, key: &StoreKey, commit: &str) -> Result<Option<StoredRun>> {
        Ok(self.entry(key).and_then(|e| e.tries.get(commit).cloned()))
    }

    fn load_xfails(&self, key: &StoreKey) -> Result<XfailList> {
        Ok(self.entry(key).map(|e| e.xfails.clone()).unwrap_or_default())
    }

    fn last_commit(&self, key: &StoreKey) -> Result<Option<String>> {
        Ok(self
            .entry(key)
            .and_then(|e| e.baseline.as_ref())
            .map(|b| b.commit.clone()))
    }
}
