//! Monthly summary persistence
//!
//! Writes go through a [`SummaryTransaction`]: changes become visible on
//! [`SummaryTransaction::commit`] and are discarded when the transaction is
//! dropped uncommitted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use billsheet_core::{InvoiceKey, MonthlySummary};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Summary store error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("summary store lock poisoned")]
    Poisoned,

    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed summary file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("summary store unavailable: {0}")]
    Unavailable(String),
}

/// Where monthly summaries are kept
pub trait SummaryStore {
    /// Open a write transaction
    fn begin(&self) -> Result<Box<dyn SummaryTransaction + '_>, StoreError>;

    /// Every stored summary, ordered by secretary then period
    fn list(&self) -> Result<Vec<MonthlySummary>, StoreError>;
}

/// A pending set of summary writes
pub trait SummaryTransaction {
    /// Insert, or replace the summary with the same (secretary, period)
    fn upsert(&mut self, summary: MonthlySummary) -> Result<(), StoreError>;

    /// Make the writes visible
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

impl<S: SummaryStore + ?Sized> SummaryStore for &S {
    fn begin(&self) -> Result<Box<dyn SummaryTransaction + '_>, StoreError> {
        (**self).begin()
    }

    fn list(&self) -> Result<Vec<MonthlySummary>, StoreError> {
        (**self).list()
    }
}

type SummaryMap = BTreeMap<InvoiceKey, MonthlySummary>;

fn index(summaries: Vec<MonthlySummary>) -> SummaryMap {
    summaries.into_iter().map(|s| (s.key(), s)).collect()
}

// ============================================================================
// In-memory
// ============================================================================

/// Summaries held in memory
#[derive(Debug, Default)]
pub struct MemorySummaryStore {
    summaries: Mutex<SummaryMap>,
}

impl MemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &InvoiceKey) -> Result<Option<MonthlySummary>, StoreError> {
        let summaries = self.summaries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(summaries.get(key).cloned())
    }
}

impl SummaryStore for MemorySummaryStore {
    fn begin(&self) -> Result<Box<dyn SummaryTransaction + '_>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            target: &self.summaries,
            pending: Vec::new(),
        }))
    }

    fn list(&self) -> Result<Vec<MonthlySummary>, StoreError> {
        let summaries = self.summaries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(summaries.values().cloned().collect())
    }
}

struct MemoryTransaction<'a> {
    target: &'a Mutex<SummaryMap>,
    pending: Vec<MonthlySummary>,
}

impl SummaryTransaction for MemoryTransaction<'_> {
    fn upsert(&mut self, summary: MonthlySummary) -> Result<(), StoreError> {
        self.pending.push(summary);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut summaries = self.target.lock().map_err(|_| StoreError::Poisoned)?;
        for summary in self.pending {
            summaries.insert(summary.key(), summary);
        }
        Ok(())
    }
}

// ============================================================================
// JSON file
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct SummaryFile {
    #[serde(default)]
    summaries: Vec<MonthlySummary>,
}

/// Summaries kept in a JSON file.
///
/// A transaction holds the store lock from `begin` to commit or drop. Commit
/// writes a sibling temporary file and renames it over the original, so a
/// failed write never leaves a half-written store behind.
#[derive(Debug)]
pub struct JsonSummaryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonSummaryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn load(&self) -> Result<SummaryMap, StoreError> {
        if !self.path.exists() {
            return Ok(SummaryMap::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let file: SummaryFile = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(index(file.summaries))
    }

    fn save(&self, summaries: &SummaryMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let file = SummaryFile {
            summaries: summaries.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::Unavailable(format!("cannot encode summaries: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), count = summaries.len(), "summaries saved");
        Ok(())
    }
}

impl SummaryStore for JsonSummaryStore {
    fn begin(&self) -> Result<Box<dyn SummaryTransaction + '_>, StoreError> {
        let guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let summaries = self.load()?;
        Ok(Box::new(JsonTransaction {
            store: self,
            _guard: guard,
            summaries,
        }))
    }

    fn list(&self) -> Result<Vec<MonthlySummary>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load()?.into_values().collect())
    }
}

struct JsonTransaction<'a> {
    store: &'a JsonSummaryStore,
    _guard: MutexGuard<'a, ()>,
    summaries: SummaryMap,
}

impl SummaryTransaction for JsonTransaction<'_> {
    fn upsert(&mut self, summary: MonthlySummary) -> Result<(), StoreError> {
        self.summaries.insert(summary.key(), summary);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.store.save(&self.summaries)
    }
}
