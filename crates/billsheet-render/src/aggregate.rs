//! Subtotal writer
//!
//! Subtotal rows sit right below each detail block. Their positions are
//! always derived from the block and the expansion, never fixed, since the
//! expansion may have moved them.

use crate::formula::cell_address;
use crate::layout::{DetailBlock, Expansion};
use crate::rows::DetailColumns;
use crate::sheet::{CellValue, RowNum, Sheet};

/// Subtotal row of the expanded taxable block: `first data row + capacity + extra rows`
pub fn taxable_subtotal_row(block: &DetailBlock, expansion: &Expansion) -> RowNum {
    block.insertion_row() + expansion.extra_rows
}

/// Subtotal row of the non-taxable block, following it if the expansion moved it
pub fn non_taxable_subtotal_row(block: &DetailBlock, expansion: &Expansion) -> RowNum {
    expansion.shifted(block.insertion_row())
}

/// Write `SUM` over the filled detail rows and return the subtotal row
pub fn write_taxable_subtotal(
    sheet: &mut Sheet,
    block: &DetailBlock,
    expansion: &Expansion,
    item_count: usize,
    columns: &DetailColumns,
) -> RowNum {
    let row = taxable_subtotal_row(block, expansion);
    let value = match u32::try_from(item_count) {
        Ok(n) if n > 0 => {
            let first = block.first_data_row();
            let last = first + n - 1;
            CellValue::Formula(format!(
                "=SUM({}:{})",
                cell_address(first, columns.amount),
                cell_address(last, columns.amount)
            ))
        }
        _ => CellValue::Number(0.0),
    };
    sheet.set_value(row, columns.amount, value);
    row
}

/// Write the non-taxable subtotal and return its row.
///
/// No line items feed this block yet, so the subtotal is always zero.
pub fn write_non_taxable_subtotal(
    sheet: &mut Sheet,
    block: &DetailBlock,
    expansion: &Expansion,
    columns: &DetailColumns,
) -> RowNum {
    let row = non_taxable_subtotal_row(block, expansion);
    sheet.set_value(row, columns.amount, 0.0);
    row
}
