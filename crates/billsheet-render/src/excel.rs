//! XLSX output
//!
//! Writes a [`Sheet`] as a single-worksheet workbook with `rust_xlsxwriter`.
//! Each template style becomes one reusable `Format`; cells without a style
//! and without content are skipped.
//!
//! Workbooks produced by `rust_xlsxwriter` always carry `fullCalcOnLoad`, so
//! formulas are recomputed on open whether or not the sheet sets
//! `force_recalculation`.

use billsheet_core::XLSX_MIME_TYPE;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::sheet::{BorderLine, Cell, CellStyle, CellValue, ColNum, HAlign, Sheet};
use crate::{DocumentWriter, RenderError};

/// Serializes sheets to Office Open XML workbooks
#[derive(Clone, Copy, Debug, Default)]
pub struct XlsxWriter;

impl DocumentWriter for XlsxWriter {
    fn write(&self, sheet: &Sheet) -> Result<Vec<u8>, RenderError> {
        if !sheet.force_recalculation {
            debug!(sheet = %sheet.name, "xlsx workbooks always recalculate on open");
        }
        let mut workbook = Workbook::new();
        let formats: Vec<Format> = sheet.styles().iter().map(build_format).collect();
        let plain = Format::new();

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .map_err(|e| RenderError::Format(format!("sheet name '{}': {e}", sheet.name)))?;

        for (col, width) in sheet.column_widths() {
            worksheet
                .set_column_width(col, width)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for (row_num, row) in sheet.rows() {
            let row_index = row_num - 1;
            if let Some(height) = row.height {
                worksheet
                    .set_row_height(row_index, height)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }
            for (col, cell) in row.cells() {
                let format = cell.style.and_then(|id| formats.get(id.index()));
                write_cell(worksheet, row_index, col, cell, format, &plain)?;
            }
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;

        Ok(buffer)
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn mime_type(&self) -> &'static str {
        XLSX_MIME_TYPE
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: ColNum,
    cell: &Cell,
    format: Option<&Format>,
    plain: &Format,
) -> Result<(), RenderError> {
    let result = match &cell.value {
        CellValue::Empty => match format {
            Some(format) => worksheet.write_blank(row, col, format),
            None => return Ok(()),
        },
        // Excel has no empty strings; an empty text cell is a blank one.
        CellValue::Text(text) if text.is_empty() => match format {
            Some(format) => worksheet.write_blank(row, col, format),
            None => return Ok(()),
        },
        CellValue::Text(text) => {
            worksheet.write_string_with_format(row, col, text, format.unwrap_or(plain))
        }
        CellValue::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, format.unwrap_or(plain))
        }
        CellValue::Formula(text) => {
            worksheet.write_formula_with_format(row, col, text.as_str(), format.unwrap_or(plain))
        }
    };

    result
        .map(|_| ())
        .map_err(|e| RenderError::Format(format!("Failed to write cell ({}, {}): {e}", row + 1, col)))
}

/// Translate a template style into an Excel format
fn build_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    if style.bold {
        format = format.set_bold();
    }
    if style.italic {
        format = format.set_italic();
    }
    if let Some(size) = style.font_size {
        format = format.set_font_size(size);
    }
    if let Some(color) = style.font_color {
        format = format.set_font_color(color.0);
    }
    if let Some(color) = style.background {
        format = format.set_background_color(color.0);
    }
    if let Some(align) = style.align {
        format = format.set_align(match align {
            HAlign::Left => FormatAlign::Left,
            HAlign::Center => FormatAlign::Center,
            HAlign::Right => FormatAlign::Right,
        });
    }
    if let Some(border) = style.border {
        format = format.set_border(match border {
            BorderLine::Thin => FormatBorder::Thin,
            BorderLine::Medium => FormatBorder::Medium,
            BorderLine::Thick => FormatBorder::Thick,
            BorderLine::Double => FormatBorder::Double,
        });
    }
    if let Some(num_format) = &style.num_format {
        format = format.set_num_format(num_format);
    }
    if style.wrap {
        format = format.set_text_wrap();
    }

    format
}
