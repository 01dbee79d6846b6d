//! Rolling record of past campaign topics, persisted as one JSON array.
//!
//! The store assumes a single writer: one cycle reads it at start and writes
//! it at the end. Running two agents against the same file is unsupported.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub platforms: BTreeSet<String>,
}

impl HistoryEntry {
    pub fn new(timestamp: DateTime<Utc>, topic: impl Into<String>) -> Self {
        Self {
            timestamp,
            topic: topic.into(),
            keywords: BTreeSet::new(),
            platforms: BTreeSet::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms.extend(platforms.into_iter().map(Into::into));
        self
    }
}

/// Durable campaign memory.
pub trait HistoryStore: Send + Sync {
    /// Entries inside the retention window, oldest first.
    fn load(&self) -> Result<Vec<HistoryEntry>, StorageError>;

    /// Add one entry, prune, and persist the pruned set.
    fn append(&self, entry: HistoryEntry) -> Result<(), StorageError>;
}

/// Drop entries at or before `now - retention`, keeping the rest in chronological order.
/// A window reaching past the earliest representable instant keeps everything.
pub fn prune(entries: Vec<HistoryEntry>, now: DateTime<Utc>, retention: Duration) -> Vec<HistoryEntry> {
    let cutoff = window_start(now, retention);
    let mut kept: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|e| e.timestamp > cutoff)
        .collect();
    kept.sort_by_key(|e| e.timestamp);
    kept
}

/// `now - window`, saturating at the earliest representable instant.
pub(crate) fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub struct JsonHistoryStore {
    path: PathBuf,
    retention: Duration,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            path: path.into(),
            retention,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_at(&self, now: DateTime<Utc>) -> Result<Vec<HistoryEntry>, StorageError> {
        Ok(prune(self.read_all()?, now, self.retention))
    }

    pub fn append_at(&self, entry: HistoryEntry, now: DateTime<Utc>) -> Result<(), StorageError> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Existing history unreadable, starting a fresh log");
                Vec::new()
            }
        };
        entries.push(entry);
        let entries = prune(entries, now, self.retention);
        self.write_all(&entries)?;
        debug!(path = %self.path.display(), entries = entries.len(), "History persisted");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)
            .map_err(|e| StorageError::unavailable(&self.path, e))?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|e| StorageError::unavailable(&self.path, e))
    }

    // Temp file + rename so a crash mid-write never leaves a truncated log.
    fn write_all(&self, entries: &[HistoryEntry]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::unavailable(&self.path, e))?;
        }
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::unavailable(&self.path, e))?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, json).map_err(|e| StorageError::unavailable(&self.path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::unavailable(&self.path, e))
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        self.load_at(Utc::now())
    }

    fn append(&self, entry: HistoryEntry) -> Result<(), StorageError> {
        self.append_at(entry, Utc::now())
    }
}
