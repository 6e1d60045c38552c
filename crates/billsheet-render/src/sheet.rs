//! In-memory worksheet store
//!
//! A `Sheet` is an array of rows, each an array of cells. Rows are addressed
//! 1-based and columns 0-based (`A` = 0), the same convention the A1 helpers
//! in [`crate::formula`] use. Styles live in a per-sheet table and cells refer
//! to them by [`StyleId`], so copying a row's look is copying ids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::formula::shift_row_references;

/// 1-based row number
pub type RowNum = u32;

/// 0-based column index
pub type ColNum = u16;

// ============================================================================
// Styles
// ============================================================================

/// Index into a sheet's style table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(usize);

impl StyleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Horizontal alignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Border line weight applied to all four edges
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderLine {
    Thin,
    Medium,
    Thick,
    Double,
}

/// 24-bit RGB colour, written as `#RRGGBB` in templates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u32);

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(format!("expected #RRGGBB colour, got '{value}'"));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb)
            .map_err(|_| format!("expected #RRGGBB colour, got '{value}'"))
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        format!("#{:06X}", rgb.0)
    }
}

/// Visual style of a cell
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CellStyle {
    pub bold: bool,
    pub italic: bool,
    pub font_size: Option<f64>,
    pub font_color: Option<Rgb>,
    pub background: Option<Rgb>,
    pub align: Option<HAlign>,
    pub border: Option<BorderLine>,
    pub num_format: Option<String>,
    pub wrap: bool,
}

// ============================================================================
// Cells and Rows
// ============================================================================

/// Content of a cell
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// Formula text including the leading `=`
    Formula(String),
}

impl CellValue {
    pub fn formula(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with('=') {
            Self::Formula(text)
        } else {
            Self::Formula(format!("={text}"))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<StyleId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    /// Height in points; `None` keeps the application default
    pub height: Option<f64>,
    cells: Vec<Cell>,
}

impl Row {
    pub fn cell(&self, col: ColNum) -> Option<&Cell> {
        self.cells.get(usize::from(col))
    }

    fn cell_mut(&mut self, col: ColNum) -> &mut Cell {
        let index = usize::from(col);
        if index >= self.cells.len() {
            self.cells.resize_with(index + 1, Cell::default);
        }
        &mut self.cells[index]
    }

    /// Cells with their column index
    pub fn cells(&self) -> impl Iterator<Item = (ColNum, &Cell)> {
        self.cells.iter().enumerate().map(|(i, c)| (i as ColNum, c))
    }
}

// ============================================================================
// Sheet
// ============================================================================

/// A single worksheet
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Row>,
    styles: Vec<CellStyle>,
    column_widths: BTreeMap<ColNum, f64>,
    /// Ask consuming applications to recompute every formula on open.
    ///
    /// Advisory: writers whose format always recalculates (XLSX) ignore it.
    pub force_recalculation: bool,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register a style, reusing an identical existing entry
    pub fn add_style(&mut self, style: CellStyle) -> StyleId {
        if let Some(i) = self.styles.iter().position(|s| *s == style) {
            return StyleId(i);
        }
        self.styles.push(style);
        StyleId(self.styles.len() - 1)
    }

    pub fn style(&self, id: StyleId) -> Option<&CellStyle> {
        self.styles.get(id.0)
    }

    pub fn styles(&self) -> &[CellStyle] {
        &self.styles
    }

    pub fn set_column_width(&mut self, col: ColNum, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (ColNum, f64)> + '_ {
        self.column_widths.iter().map(|(c, w)| (*c, *w))
    }

    /// Number of the last allocated row (0 for an empty sheet)
    pub fn row_count(&self) -> RowNum {
        self.rows.len() as RowNum
    }

    pub fn row(&self, row: RowNum) -> Option<&Row> {
        let index = row.checked_sub(1)? as usize;
        self.rows.get(index)
    }

    /// Rows with their 1-based number
    pub fn rows(&self) -> impl Iterator<Item = (RowNum, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| (i as RowNum + 1, r))
    }

    fn row_mut(&mut self, row: RowNum) -> &mut Row {
        assert!(row >= 1, "rows are 1-based");
        let index = (row - 1) as usize;
        if index >= self.rows.len() {
            self.rows.resize_with(index + 1, Row::default);
        }
        &mut self.rows[index]
    }

    pub fn cell(&self, row: RowNum, col: ColNum) -> Option<&Cell> {
        self.row(row)?.cell(col)
    }

    /// Value of a cell, `Empty` when never written
    pub fn value(&self, row: RowNum, col: ColNum) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.cell(row, col).map_or(EMPTY, |c| &c.value)
    }

    /// Replace a cell's value, keeping its style
    pub fn set_value(&mut self, row: RowNum, col: ColNum, value: impl Into<CellValue>) {
        self.row_mut(row).cell_mut(col).value = value.into();
    }

    pub fn set_style(&mut self, row: RowNum, col: ColNum, style: Option<StyleId>) {
        self.row_mut(row).cell_mut(col).style = style;
    }

    pub fn row_height(&self, row: RowNum) -> Option<f64> {
        self.row(row)?.height
    }

    pub fn set_row_height(&mut self, row: RowNum, height: Option<f64>) {
        self.row_mut(row).height = height;
    }

    /// Insert `count` empty rows before row `at`.
    ///
    /// Rows from `at` downwards move by `count` together with their values,
    /// styles and heights; the inserted rows are new and empty. Every formula
    /// in the sheet that points at a moved row is re-pointed.
    pub fn insert_rows(&mut self, at: RowNum, count: u32) {
        assert!(at >= 1, "rows are 1-based");
        if count == 0 {
            return;
        }

        let index = (at - 1) as usize;
        if index < self.rows.len() {
            let fresh = std::iter::repeat_with(Row::default).take(count as usize);
            self.rows.splice(index..index, fresh);
        }

        for row in &mut self.rows {
            for cell in &mut row.cells {
                if let CellValue::Formula(text) = &mut cell.value {
                    *text = shift_row_references(text, at, count);
                }
            }
        }
    }

    /// Copy the height and per-column styles (not values) of one row onto another.
    ///
    /// Columns styled in `to` but not in `from` are cleared so both rows look alike.
    pub fn copy_row_format(&mut self, from: RowNum, to: RowNum) {
        let (height, styles): (Option<f64>, Vec<Option<StyleId>>) = match self.row(from) {
            Some(source) => (source.height, source.cells.iter().map(|c| c.style).collect()),
            None => (None, Vec::new()),
        };

        let target = self.row_mut(to);
        target.height = height;
        for (col, cell) in target.cells.iter_mut().enumerate() {
            cell.style = styles.get(col).copied().flatten();
        }
        for (col, style) in styles.into_iter().enumerate() {
            if style.is_some() {
                target.cell_mut(col as ColNum).style = style;
            }
        }
    }
}

/// Read access to cell text, used for anchor discovery
pub trait CellText {
    /// Text content of a cell, `None` for non-text or empty cells
    fn text_at(&self, row: RowNum, col: ColNum) -> Option<&str>;
}

impl CellText for Sheet {
    fn text_at(&self, row: RowNum, col: ColNum) -> Option<&str> {
        match self.cell(row, col).map(|c| &c.value) {
            Some(CellValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bordered(sheet: &mut Sheet) -> StyleId {
        sheet.add_style(CellStyle {
            border: Some(BorderLine::Thin),
            ..CellStyle::default()
        })
    }

    #[test]
    fn set_value_grows_and_keeps_style() {
        let mut sheet = Sheet::new("S");
        let style = bordered(&mut sheet);
        sheet.set_style(3, 2, Some(style));
        sheet.set_value(3, 2, "hello");

        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.text_at(3, 2), Some("hello"));
        assert_eq!(sheet.cell(3, 2).unwrap().style, Some(style));
        assert_eq!(sheet.value(1, 0), &CellValue::Empty);
        assert_eq!(sheet.value(99, 0), &CellValue::Empty);
    }

    #[test]
    fn add_style_deduplicates() {
        let mut sheet = Sheet::new("S");
        let a = bordered(&mut sheet);
        let b = bordered(&mut sheet);
        assert_eq!(a, b);
        assert_eq!(sheet.styles().len(), 1);
    }

    #[test]
    fn insert_rows_moves_rows_below() {
        let mut sheet = Sheet::new("S");
        sheet.set_value(1, 0, "top");
        sheet.set_value(2, 0, "moves");
        sheet.set_row_height(2, Some(30.0));
        sheet.set_value(3, 0, CellValue::formula("A2&\"!\""));

        sheet.insert_rows(2, 2);

        assert_eq!(sheet.text_at(1, 0), Some("top"));
        assert_eq!(sheet.value(2, 0), &CellValue::Empty);
        assert_eq!(sheet.value(3, 0), &CellValue::Empty);
        assert_eq!(sheet.text_at(4, 0), Some("moves"));
        assert_eq!(sheet.row_height(4), Some(30.0));
        assert_eq!(sheet.value(5, 0), &CellValue::formula("A4&\"!\""));
        assert_eq!(sheet.row_count(), 5);
    }

    #[test]
    fn insert_rows_repoints_formulas_above_the_insertion() {
        let mut sheet = Sheet::new("S");
        sheet.set_value(1, 0, CellValue::formula("SUM(A2:A10)"));
        sheet.set_value(10, 0, 1.0);

        sheet.insert_rows(5, 3);

        assert_eq!(sheet.value(1, 0), &CellValue::formula("SUM(A2:A13)"));
        assert_eq!(sheet.value(13, 0), &CellValue::Number(1.0));
    }

    #[test]
    fn insert_rows_past_the_end_allocates_nothing() {
        let mut sheet = Sheet::new("S");
        sheet.set_value(2, 0, "x");
        sheet.insert_rows(10, 4);
        assert_eq!(sheet.row_count(), 2);
    }

    #[test]
    fn copy_row_format_copies_style_not_value() {
        let mut sheet = Sheet::new("S");
        let style = bordered(&mut sheet);
        sheet.set_row_height(1, Some(18.5));
        sheet.set_style(1, 0, Some(style));
        sheet.set_style(1, 3, Some(style));
        sheet.set_value(1, 0, "pattern");
        sheet.set_value(4, 1, "kept");
        sheet.set_style(4, 1, Some(style));

        sheet.copy_row_format(1, 4);

        assert_eq!(sheet.row_height(4), Some(18.5));
        assert_eq!(sheet.cell(4, 0).unwrap().style, Some(style));
        assert_eq!(sheet.cell(4, 1).unwrap().style, None);
        assert_eq!(sheet.cell(4, 3).unwrap().style, Some(style));
        assert_eq!(sheet.value(4, 0), &CellValue::Empty);
        assert_eq!(sheet.text_at(4, 1), Some("kept"));
    }

    #[test]
    fn text_at_ignores_numbers_and_formulas() {
        let mut sheet = Sheet::new("S");
        sheet.set_value(1, 0, 5.0);
        sheet.set_value(1, 1, CellValue::formula("A1"));
        assert_eq!(sheet.text_at(1, 0), None);
        assert_eq!(sheet.text_at(1, 1), None);
    }

    #[test]
    fn rgb_parses_hex() {
        assert_eq!(Rgb::try_from("#4472C4".to_string()), Ok(Rgb(0x4472C4)));
        assert_eq!(String::from(Rgb(0xE2EFDA)), "#E2EFDA");
        assert!(Rgb::try_from("blue".to_string()).is_err());
    }
}
