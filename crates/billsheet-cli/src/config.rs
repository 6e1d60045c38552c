//! CLI configuration file
//!
//! ```toml
//! template = "templates/invoice.toml"
//! data = "invoices.json"
//! store = "summaries.json"
//! output_dir = "out"
//!
//! [layout]
//! taxable_capacity = 8
//! ```
//!
//! Relative paths are taken as given, i.e. relative to the working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use billsheet_render::InvoiceLayout;
use serde::Deserialize;

/// Store used when neither flag nor config names one
pub const DEFAULT_STORE: &str = "billsheet-summaries.json";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Template file; the built-in template when absent
    pub template: Option<PathBuf>,
    /// JSON invoice data file
    pub data: Option<PathBuf>,
    /// JSON summary store
    pub store: Option<PathBuf>,
    /// Where documents are written; the working directory when absent
    pub output_dir: Option<PathBuf>,
    pub layout: InvoiceLayout,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE))
    }
}
