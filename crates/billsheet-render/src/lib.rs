//! # billsheet-render
//!
//! Template-driven invoice sheets.
//!
//! This crate provides:
//! - An in-memory [`Sheet`] model with styles, row heights and row insertion
//!   that keeps formulas pointing at the cells they referenced
//! - Invoice templates described in TOML, embedded or loaded from disk
//! - Marker-based discovery of the detail blocks, with legacy fallbacks
//! - The [`InvoiceAssembler`], which fills a template with one invoice
//! - XLSX serialization through `rust_xlsxwriter`
//!
//! ## Example
//!
//! ```rust,ignore
//! use billsheet_core::{InvoiceData, InvoiceKey, LineItem, Period};
//! use billsheet_render::{EmbeddedTemplate, InvoiceAssembler};
//!
//! let mut data = InvoiceData::new(InvoiceKey::new("sec-1", "2026-09".parse()?));
//! data.line_items.push(LineItem::new("co-1").label("Acme Corp").minutes(90));
//!
//! let document = InvoiceAssembler::default().assemble(&EmbeddedTemplate, &data)?;
//! std::fs::write(&document.file_name, &document.bytes)?;
//! ```

pub mod aggregate;
pub mod anchor;
pub mod assembler;
pub mod config;
pub mod excel;
pub mod formula;
pub mod layout;
pub mod rows;
pub mod sheet;
pub mod template;

pub use anchor::{Anchor, AnchorLocator, AnchorOrigin, Anchors, ScanBounds};
pub use assembler::{AssembledSheet, InvoiceAssembler, Placement};
pub use config::{HeaderCells, InvoiceLayout, Markers};
pub use excel::XlsxWriter;
pub use formula::CellAddress;
pub use layout::{DetailBlock, Expansion};
pub use rows::DetailColumns;
pub use sheet::{CellText, CellValue, Sheet};
pub use template::{
    EmbeddedTemplate, TemplateError, TemplateFile, TemplateSource, DEFAULT_TEMPLATE,
};

use thiserror::Error;

/// Turns a filled sheet into document bytes
pub trait DocumentWriter {
    /// Serialize the sheet
    fn write(&self, sheet: &Sheet) -> Result<Vec<u8>, RenderError>;

    /// File extension without the dot
    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Format error: {0}")]
    Format(String),
}
