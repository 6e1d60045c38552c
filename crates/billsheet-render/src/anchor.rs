//! Anchor discovery
//!
//! Detail blocks are found by scanning for marker text instead of trusting
//! fixed coordinates, so templates can gain or lose rows above a block
//! without breaking generation. Matching is exact (after trimming the cell
//! text): marker strings are unique in the template and loose matching would
//! hit similar labels.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{InvoiceLayout, Markers};
use crate::sheet::{CellText, ColNum, RowNum};

/// Default number of rows scanned for markers
pub const DEFAULT_SCAN_ROWS: RowNum = 200;

/// Default number of columns scanned per row
pub const DEFAULT_SCAN_COLS: ColNum = 30;

/// How much of the sheet a marker scan covers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanBounds {
    pub max_rows: RowNum,
    pub max_cols: ColNum,
}

impl Default for ScanBounds {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_SCAN_ROWS,
            max_cols: DEFAULT_SCAN_COLS,
        }
    }
}

/// Row of the first cell whose trimmed text equals `marker`.
///
/// Rows are scanned top to bottom, cells left to right, within `bounds`.
pub fn locate_row<G: CellText + ?Sized>(grid: &G, marker: &str, bounds: ScanBounds) -> Option<RowNum> {
    (1..=bounds.max_rows).find(|&row| {
        (0..bounds.max_cols).any(|col| grid.text_at(row, col).is_some_and(|t| t.trim() == marker))
    })
}

/// Where an anchor row came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorOrigin {
    /// Found by its marker text
    Marker,
    /// Marker missing or inconsistent; the legacy fixed row was used
    Legacy,
}

/// A resolved anchor row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Anchor {
    pub row: RowNum,
    pub origin: AnchorOrigin,
}

/// Header rows of both detail blocks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Anchors {
    /// Company/rank header of the taxable block
    pub detail_header: Anchor,
    /// Header of the non-taxable block
    pub non_taxable_header: Anchor,
}

/// Resolves the anchors of an invoice template
#[derive(Clone, Debug)]
pub struct AnchorLocator {
    bounds: ScanBounds,
    markers: Markers,
    legacy_detail_header_row: RowNum,
    legacy_non_taxable_header_row: RowNum,
}

impl AnchorLocator {
    pub fn new(layout: &InvoiceLayout) -> Self {
        Self {
            bounds: layout.scan,
            markers: layout.markers.clone(),
            legacy_detail_header_row: layout.legacy_detail_header_row,
            legacy_non_taxable_header_row: layout.legacy_non_taxable_header_row,
        }
    }

    /// Resolve both anchors, falling back to the legacy rows.
    ///
    /// The company marker and the rank marker label the same header row;
    /// when either is missing or they disagree the legacy row is used, which
    /// keeps older template revisions without marker text working.
    pub fn resolve<G: CellText + ?Sized>(&self, grid: &G) -> Anchors {
        let company = locate_row(grid, &self.markers.company, self.bounds);
        let rank = locate_row(grid, &self.markers.rank, self.bounds);

        let detail_header = match (company, rank) {
            (Some(c), Some(r)) if c == r => Anchor {
                row: c,
                origin: AnchorOrigin::Marker,
            },
            _ => {
                warn!(
                    ?company,
                    ?rank,
                    fallback = self.legacy_detail_header_row,
                    "detail header markers not found together; using legacy row"
                );
                Anchor {
                    row: self.legacy_detail_header_row,
                    origin: AnchorOrigin::Legacy,
                }
            }
        };

        let non_taxable_header = match locate_row(grid, &self.markers.non_taxable, self.bounds) {
            Some(row) => Anchor {
                row,
                origin: AnchorOrigin::Marker,
            },
            None => {
                warn!(
                    fallback = self.legacy_non_taxable_header_row,
                    "non-taxable marker not found; using legacy row"
                );
                Anchor {
                    row: self.legacy_non_taxable_header_row,
                    origin: AnchorOrigin::Legacy,
                }
            }
        };

        debug!(
            detail = detail_header.row,
            non_taxable = non_taxable_header.row,
            "anchors resolved"
        );
        Anchors {
            detail_header,
            non_taxable_header,
        }
    }
}
