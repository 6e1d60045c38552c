//! Detail row writer

use billsheet_core::LineItem;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::formula::{cell_address, column_letters};
use crate::sheet::{CellValue, ColNum, RowNum, Sheet};

/// Columns of a detail row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetailColumns {
    #[serde(with = "column_letters")]
    pub label: ColNum,
    #[serde(with = "column_letters")]
    pub rank: ColNum,
    #[serde(with = "column_letters")]
    pub hours: ColNum,
    #[serde(with = "column_letters")]
    pub minutes: ColNum,
    #[serde(with = "column_letters")]
    pub rate: ColNum,
    #[serde(with = "column_letters")]
    pub amount: ColNum,
}

impl Default for DetailColumns {
    fn default() -> Self {
        Self {
            label: 0,
            rank: 1,
            hours: 2,
            minutes: 3,
            rate: 4,
            amount: 5,
        }
    }
}

/// Amount formula for one row, e.g. `=ROUND(E16*(C16+D16/60),0)`
pub fn amount_formula(row: RowNum, columns: &DetailColumns) -> String {
    format!(
        "=ROUND({}*({}+{}/60),0)",
        cell_address(row, columns.rate),
        cell_address(row, columns.hours),
        cell_address(row, columns.minutes)
    )
}

/// Write one item into `row`.
///
/// Only the row's detail columns are written. Without a rate the rate cell
/// keeps whatever the template put there.
pub fn write_line_item(sheet: &mut Sheet, row: RowNum, item: &LineItem, columns: &DetailColumns) {
    sheet.set_value(row, columns.label, item.label.clone().unwrap_or_default());
    sheet.set_value(row, columns.rank, item.rank.clone().unwrap_or_default());
    sheet.set_value(row, columns.hours, item.hours());
    sheet.set_value(row, columns.minutes, item.remainder_minutes());
    if let Some(rate) = item.hourly_rate.and_then(|r| r.to_f64()) {
        sheet.set_value(row, columns.rate, rate);
    }
    sheet.set_value(row, columns.amount, CellValue::Formula(amount_formula(row, columns)));
}

/// Write items on consecutive rows starting at `first_row`
pub fn write_detail_rows(
    sheet: &mut Sheet,
    first_row: RowNum,
    items: &[LineItem],
    columns: &DetailColumns,
) {
    for (row, item) in (first_row..).zip(items) {
        write_line_item(sheet, row, item, columns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellText;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn formula_uses_own_row() {
        let columns = DetailColumns::default();
        assert_eq!(amount_formula(16, &columns), "=ROUND(E16*(C16+D16/60),0)");
        assert_eq!(amount_formula(123, &columns), "=ROUND(E123*(C123+D123/60),0)");
    }

    #[test]
    fn writes_all_columns() {
        let mut sheet = Sheet::new("S");
        let item = LineItem::new("c-1")
            .label("Acme Corp")
            .rank("A")
            .minutes(125)
            .rate(dec!(3000));

        write_line_item(&mut sheet, 16, &item, &DetailColumns::default());

        assert_eq!(sheet.text_at(16, 0), Some("Acme Corp"));
        assert_eq!(sheet.text_at(16, 1), Some("A"));
        assert_eq!(sheet.value(16, 2), &CellValue::Number(2.0));
        assert_eq!(sheet.value(16, 3), &CellValue::Number(5.0));
        assert_eq!(sheet.value(16, 4), &CellValue::Number(3000.0));
        assert_eq!(
            sheet.value(16, 5),
            &CellValue::Formula("=ROUND(E16*(C16+D16/60),0)".into())
        );
    }

    #[test]
    fn missing_values_render_empty_and_rate_is_untouched() {
        let mut sheet = Sheet::new("S");
        sheet.set_value(16, 4, "n/a");
        write_line_item(&mut sheet, 16, &LineItem::new("c-1").minutes(59), &DetailColumns::default());

        assert_eq!(sheet.text_at(16, 0), Some(""));
        assert_eq!(sheet.text_at(16, 1), Some(""));
        assert_eq!(sheet.value(16, 2), &CellValue::Number(0.0));
        assert_eq!(sheet.value(16, 3), &CellValue::Number(59.0));
        assert_eq!(sheet.text_at(16, 4), Some("n/a"));
    }

    #[test]
    fn rows_do_not_touch_neighbours() {
        let mut sheet = Sheet::new("S");
        sheet.set_value(15, 0, "Company");
        sheet.set_value(18, 0, "below");
        sheet.set_value(16, 6, "side note");
        let items = vec![
            LineItem::new("a").label("A").minutes(60),
            LineItem::new("b").label("B").minutes(30),
        ];

        write_detail_rows(&mut sheet, 16, &items, &DetailColumns::default());

        assert_eq!(sheet.text_at(15, 0), Some("Company"));
        assert_eq!(sheet.text_at(16, 0), Some("A"));
        assert_eq!(sheet.text_at(17, 0), Some("B"));
        assert_eq!(sheet.text_at(18, 0), Some("below"));
        assert_eq!(sheet.text_at(16, 6), Some("side note"));
    }
}
