//! Invoice data access
//!
//! An [`InvoiceSource`] answers one question: everything needed to draw the
//! invoice for a (secretary, period). Line items come back sorted with
//! [`sort_line_items`] whatever the backing order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use billsheet_core::{sort_line_items, InvoiceData, InvoiceKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Data access error
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no invoice data for {0}")]
    Missing(InvoiceKey),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed invoice data in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads invoice input
pub trait InvoiceSource {
    fn fetch(&self, key: &InvoiceKey) -> Result<InvoiceData, SourceError>;
}

impl<S: InvoiceSource + ?Sized> InvoiceSource for &S {
    fn fetch(&self, key: &InvoiceKey) -> Result<InvoiceData, SourceError> {
        (**self).fetch(key)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Invoice data held in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryInvoiceSource {
    invoices: BTreeMap<InvoiceKey, InvoiceData>,
}

impl MemoryInvoiceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the data for `data.key`
    pub fn with(mut self, data: InvoiceData) -> Self {
        self.insert(data);
        self
    }

    pub fn insert(&mut self, data: InvoiceData) {
        self.invoices.insert(data.key.clone(), data);
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }
}

impl InvoiceSource for MemoryInvoiceSource {
    fn fetch(&self, key: &InvoiceKey) -> Result<InvoiceData, SourceError> {
        let mut data = self
            .invoices
            .get(key)
            .cloned()
            .ok_or_else(|| SourceError::Missing(key.clone()))?;
        sort_line_items(&mut data.line_items);
        Ok(data)
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// On-disk layout of a JSON invoice file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InvoiceFile {
    #[serde(default)]
    pub invoices: Vec<InvoiceData>,
}

/// Invoice data read from a JSON file on every fetch
#[derive(Clone, Debug)]
pub struct JsonInvoiceSource {
    path: PathBuf,
}

impl JsonInvoiceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the whole file
    pub fn read(&self) -> Result<InvoiceFile, SourceError> {
        let path = self.path.display().to_string();
        let raw = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SourceError::Parse { path, source })
    }
}

impl InvoiceSource for JsonInvoiceSource {
    fn fetch(&self, key: &InvoiceKey) -> Result<InvoiceData, SourceError> {
        let file = self.read()?;
        let mut data = file
            .invoices
            .into_iter()
            .find(|d| &d.key == key)
            .ok_or_else(|| SourceError::Missing(key.clone()))?;
        sort_line_items(&mut data.line_items);
        debug!(
            %key,
            items = data.line_items.len(),
            tasks = data.tasks.len(),
            "invoice data loaded"
        );
        Ok(data)
    }
}
