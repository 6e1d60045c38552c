//! Detail block expansion
//!
//! A detail block is a header row followed by `capacity` pre-styled rows and
//! a subtotal row. When more items arrive than the block holds, rows are
//! inserted right after the last built-in row and styled like it.
//!
//! ```text
//! 15 | Company | Rank | ... |        header_row
//! 16 |         |      |     |   <-   first_data_row
//! .. |         |      |     |
//! 20 |         |      |     |   <-   pattern_row (last built-in row)
//! 21 | Subtotal             |   <-   insertion_row, moves down by extra rows
//! ```

use serde::Serialize;
use tracing::debug;

use crate::sheet::{RowNum, Sheet};

/// A block of detail rows below a header row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DetailBlock {
    pub header_row: RowNum,
    /// Rows the template provides for items
    pub capacity: u32,
}

impl DetailBlock {
    pub fn new(header_row: RowNum, capacity: u32) -> Self {
        Self {
            header_row,
            capacity,
        }
    }

    pub fn first_data_row(&self) -> RowNum {
        self.header_row + 1
    }

    /// Last built-in row; its look is copied onto inserted rows
    pub fn pattern_row(&self) -> RowNum {
        self.header_row + self.capacity
    }

    /// First row after the built-in rows
    pub fn insertion_row(&self) -> RowNum {
        self.first_data_row() + self.capacity
    }
}

/// Rows needed beyond a block's capacity
pub fn extra_rows(item_count: usize, capacity: u32) -> u32 {
    let item_count = u32::try_from(item_count).unwrap_or(u32::MAX);
    item_count.saturating_sub(capacity)
}

/// What an expansion did to the sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Expansion {
    /// Row before which rows were inserted
    pub inserted_at: RowNum,
    pub extra_rows: u32,
}

impl Expansion {
    /// Where a row of the original template ended up
    pub fn shifted(&self, row: RowNum) -> RowNum {
        if row >= self.inserted_at {
            row + self.extra_rows
        } else {
            row
        }
    }

    /// Rows created by the expansion
    pub fn new_rows(&self) -> std::ops::Range<RowNum> {
        self.inserted_at..self.inserted_at + self.extra_rows
    }
}

/// Grow `block` so that `item_count` items fit.
///
/// Rows from the insertion row downwards move by the number of missing rows;
/// every inserted row gets the height and column styles of the pattern row.
/// Blocks with room to spare are left as they are, trailing rows blank.
pub fn expand_block(sheet: &mut Sheet, block: &DetailBlock, item_count: usize) -> Expansion {
    let expansion = Expansion {
        inserted_at: block.insertion_row(),
        extra_rows: extra_rows(item_count, block.capacity),
    };
    if expansion.extra_rows == 0 {
        return expansion;
    }

    sheet.insert_rows(expansion.inserted_at, expansion.extra_rows);
    for row in expansion.new_rows() {
        sheet.copy_row_format(block.pattern_row(), row);
    }

    debug!(
        at = expansion.inserted_at,
        extra = expansion.extra_rows,
        pattern = block.pattern_row(),
        "expanded detail block"
    );
    expansion
}
