//! Layout settings for the invoice template
//!
//! Everything here has a default matching the built-in template; a config
//! file only needs to list what differs.

use serde::{Deserialize, Serialize};

use crate::anchor::ScanBounds;
use crate::formula::CellAddress;
use crate::rows::DetailColumns;
use crate::sheet::RowNum;

/// Detail rows the template provides in each block before rows must be added
pub const DEFAULT_BLOCK_CAPACITY: u32 = 5;

/// Header row of the taxable block in templates that predate marker text
pub const LEGACY_DETAIL_HEADER_ROW: RowNum = 15;

/// Header row of the non-taxable block in templates that predate marker text
pub const LEGACY_NON_TAXABLE_HEADER_ROW: RowNum = 25;

/// Marker text identifying the detail block headers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Markers {
    /// Label column heading of the taxable block
    pub company: String,
    /// Rank column heading on the same row
    pub rank: String,
    /// Heading of the non-taxable block
    pub non_taxable: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            company: "Company".into(),
            rank: "Rank".into(),
            non_taxable: "Non-taxable items".into(),
        }
    }
}

/// Fixed addresses of the header fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderCells {
    pub recipient_name: CellAddress,
    pub recipient_postal_code: CellAddress,
    pub recipient_address: CellAddress,
    pub recipient_phone: CellAddress,
    pub issue_date: CellAddress,
    pub period: CellAddress,
    pub bank_name: CellAddress,
    pub bank_branch: CellAddress,
    pub account_type: CellAddress,
    pub account_number: CellAddress,
    pub account_holder: CellAddress,
}

impl Default for HeaderCells {
    fn default() -> Self {
        Self {
            recipient_name: CellAddress::new(3, 0),
            recipient_postal_code: CellAddress::new(4, 0),
            recipient_address: CellAddress::new(5, 0),
            recipient_phone: CellAddress::new(6, 0),
            issue_date: CellAddress::new(3, 6),
            period: CellAddress::new(4, 6),
            bank_name: CellAddress::new(9, 1),
            bank_branch: CellAddress::new(10, 1),
            account_type: CellAddress::new(11, 1),
            account_number: CellAddress::new(12, 1),
            account_holder: CellAddress::new(13, 1),
        }
    }
}

/// How an invoice template is laid out
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvoiceLayout {
    pub scan: ScanBounds,
    pub markers: Markers,
    /// Built-in detail rows of the taxable block
    pub taxable_capacity: u32,
    /// Built-in detail rows of the non-taxable block
    pub non_taxable_capacity: u32,
    pub legacy_detail_header_row: RowNum,
    pub legacy_non_taxable_header_row: RowNum,
    pub columns: DetailColumns,
    pub header: HeaderCells,
}

impl Default for InvoiceLayout {
    fn default() -> Self {
        Self {
            scan: ScanBounds::default(),
            markers: Markers::default(),
            taxable_capacity: DEFAULT_BLOCK_CAPACITY,
            non_taxable_capacity: DEFAULT_BLOCK_CAPACITY,
            legacy_detail_header_row: LEGACY_DETAIL_HEADER_ROW,
            legacy_non_taxable_header_row: LEGACY_NON_TAXABLE_HEADER_ROW,
            columns: DetailColumns::default(),
            header: HeaderCells::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_toml_keeps_defaults() {
        let layout: InvoiceLayout = toml::from_str(
            r#"
            taxable_capacity = 8

            [markers]
            company = "Client"

            [columns]
            amount = "G"

            [header]
            issue_date = "H2"
            "#,
        )
        .unwrap();

        assert_eq!(layout.taxable_capacity, 8);
        assert_eq!(layout.non_taxable_capacity, DEFAULT_BLOCK_CAPACITY);
        assert_eq!(layout.markers.company, "Client");
        assert_eq!(layout.markers.rank, "Rank");
        assert_eq!(layout.columns.amount, 6);
        assert_eq!(layout.columns.label, 0);
        assert_eq!(layout.header.issue_date, CellAddress::new(2, 7));
        assert_eq!(layout.header.recipient_name, CellAddress::new(3, 0));
        assert_eq!(layout.scan, ScanBounds::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<InvoiceLayout, _> = toml::from_str("capacity = 3");
        assert!(result.is_err());
    }
}
