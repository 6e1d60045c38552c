//! Invoice templates
//!
//! A template is a TOML document describing one worksheet: column widths,
//! named styles, and rows of cells. Every [`TemplateSource::load`] call
//! builds a fresh [`Sheet`], so a template is never mutated in place and
//! concurrent generations never share sheet state.
//!
//! ```toml
//! name = "Invoice"
//!
//! [columns]
//! A = 30.0
//!
//! [styles.header]
//! bold = true
//!
//! [[rows]]
//! row = 15
//! height = 20.0
//! cells = [
//!     { col = "A", text = "Company", style = "header" },
//!     { col = "B", to = "F", style = "header" },
//! ]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::formula::column_index;
use crate::sheet::{CellStyle, CellValue, RowNum, Sheet};

/// The invoice template shipped with the crate
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/invoice.toml");

/// Template loading error
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("cannot read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed template: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid template: {0}")]
    Invalid(String),
}

/// Somewhere a fresh template sheet can be loaded from
pub trait TemplateSource {
    /// Build a new sheet from the template
    fn load(&self) -> Result<Sheet, TemplateError>;

    /// Human-readable origin, for logs and errors
    fn describe(&self) -> String;
}

impl<T: TemplateSource + ?Sized> TemplateSource for Box<T> {
    fn load(&self) -> Result<Sheet, TemplateError> {
        (**self).load()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// The built-in invoice template
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedTemplate;

impl TemplateSource for EmbeddedTemplate {
    fn load(&self) -> Result<Sheet, TemplateError> {
        parse_template(DEFAULT_TEMPLATE)
    }

    fn describe(&self) -> String {
        "built-in invoice template".into()
    }
}

/// A TOML template on disk, re-read on every load
#[derive(Clone, Debug)]
pub struct TemplateFile {
    path: PathBuf,
}

impl TemplateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemplateSource for TemplateFile {
    fn load(&self) -> Result<Sheet, TemplateError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TemplateError::NotFound(self.path.display().to_string())
            } else {
                TemplateError::Io {
                    path: self.path.display().to_string(),
                    source: e,
                }
            }
        })?;
        parse_template(&text)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An already built sheet; each load hands out a copy
impl TemplateSource for Sheet {
    fn load(&self) -> Result<Sheet, TemplateError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory sheet '{}'", self.name)
    }
}

// ============================================================================
// TOML document
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateDocument {
    name: String,
    #[serde(default)]
    columns: BTreeMap<String, f64>,
    #[serde(default)]
    styles: BTreeMap<String, CellStyle>,
    #[serde(default)]
    rows: Vec<RowEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RowEntry {
    row: RowNum,
    height: Option<f64>,
    #[serde(default)]
    cells: Vec<CellEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CellEntry {
    col: String,
    /// Last column of a styled span; the value goes into `col` only
    to: Option<String>,
    text: Option<String>,
    number: Option<f64>,
    formula: Option<String>,
    style: Option<String>,
}

impl CellEntry {
    fn value(&self, row: RowNum) -> Result<CellValue, TemplateError> {
        match (&self.text, self.number, &self.formula) {
            (None, None, None) => Ok(CellValue::Empty),
            (Some(text), None, None) => Ok(CellValue::Text(text.clone())),
            (None, Some(n), None) => Ok(CellValue::Number(n)),
            (None, None, Some(f)) => Ok(CellValue::formula(f.as_str())),
            _ => Err(TemplateError::Invalid(format!(
                "row {row}, column {}: text, number and formula are mutually exclusive",
                self.col
            ))),
        }
    }
}

/// Build a sheet from TOML template text
pub fn parse_template(text: &str) -> Result<Sheet, TemplateError> {
    let doc: TemplateDocument = toml::from_str(text)?;
    let mut sheet = Sheet::new(doc.name);

    for (letters, width) in &doc.columns {
        let col = column_index(letters)
            .ok_or_else(|| TemplateError::Invalid(format!("bad column '{letters}'")))?;
        sheet.set_column_width(col, *width);
    }

    let mut styles = BTreeMap::new();
    for (name, style) in doc.styles {
        let id = sheet.add_style(style);
        styles.insert(name, id);
    }

    for entry in &doc.rows {
        if entry.row == 0 {
            return Err(TemplateError::Invalid("rows are numbered from 1".into()));
        }
        if entry.height.is_some() {
            sheet.set_row_height(entry.row, entry.height);
        }
        for cell in &entry.cells {
            let first = column_index(&cell.col).ok_or_else(|| {
                TemplateError::Invalid(format!("row {}: bad column '{}'", entry.row, cell.col))
            })?;
            let last = match &cell.to {
                Some(to) => column_index(to).ok_or_else(|| {
                    TemplateError::Invalid(format!("row {}: bad column '{to}'", entry.row))
                })?,
                None => first,
            };
            if last < first {
                return Err(TemplateError::Invalid(format!(
                    "row {}: span {}..{} runs backwards",
                    entry.row,
                    cell.col,
                    cell.to.as_deref().unwrap_or_default()
                )));
            }
            let style = match &cell.style {
                Some(name) => Some(*styles.get(name).ok_or_else(|| {
                    TemplateError::Invalid(format!("row {}: unknown style '{name}'", entry.row))
                })?),
                None => None,
            };

            for col in first..=last {
                sheet.set_style(entry.row, col, style);
            }
            sheet.set_value(entry.row, first, cell.value(entry.row)?);
        }
    }

    Ok(sheet)
}
