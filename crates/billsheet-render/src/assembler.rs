//! Invoice assembly
//!
//! Turns a template and one invoice's data into a finished document:
//!
//! 1. refuse unapproved tasks (`Conflict`) and empty item lists (`NotFound`)
//!    before the template is touched
//! 2. load a fresh sheet from the template
//! 3. write the header fields at their fixed addresses
//! 4. find the detail blocks, grow the taxable one, fill its rows
//! 5. write both subtotals, flag the sheet for recalculation
//! 6. serialize

use billsheet_core::{invoice_file_name, GeneratedDocument, HeaderFacts, InvoiceData, InvoiceError};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{write_non_taxable_subtotal, write_taxable_subtotal};
use crate::anchor::{AnchorLocator, Anchors};
use crate::config::{HeaderCells, InvoiceLayout};
use crate::excel::XlsxWriter;
use crate::formula::CellAddress;
use crate::layout::{expand_block, DetailBlock, Expansion};
use crate::rows::write_detail_rows;
use crate::sheet::{CellValue, Sheet};
use crate::template::{TemplateError, TemplateSource};
use crate::DocumentWriter;

/// A filled sheet together with the positions used to fill it
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledSheet {
    pub sheet: Sheet,
    pub placement: Placement,
}

/// Where the variable parts of the invoice ended up
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub anchors: Anchors,
    pub taxable: DetailBlock,
    pub non_taxable: DetailBlock,
    pub expansion: Expansion,
    pub taxable_subtotal_row: u32,
    pub non_taxable_subtotal_row: u32,
}

/// Builds invoice documents from a template
#[derive(Clone, Debug)]
pub struct InvoiceAssembler<W = XlsxWriter> {
    layout: InvoiceLayout,
    writer: W,
}

impl Default for InvoiceAssembler<XlsxWriter> {
    fn default() -> Self {
        Self::new(InvoiceLayout::default())
    }
}

impl InvoiceAssembler<XlsxWriter> {
    pub fn new(layout: InvoiceLayout) -> Self {
        Self {
            layout,
            writer: XlsxWriter,
        }
    }
}

impl<W: DocumentWriter> InvoiceAssembler<W> {
    /// Use a different output format
    pub fn with_writer<V: DocumentWriter>(self, writer: V) -> InvoiceAssembler<V> {
        InvoiceAssembler {
            layout: self.layout,
            writer,
        }
    }

    pub fn layout(&self) -> &InvoiceLayout {
        &self.layout
    }

    /// Assemble and serialize one invoice
    pub fn assemble<T: TemplateSource + ?Sized>(
        &self,
        template: &T,
        data: &InvoiceData,
    ) -> Result<GeneratedDocument, InvoiceError> {
        let assembled = self.build_sheet(template, data)?;
        let bytes = self
            .writer
            .write(&assembled.sheet)
            .map_err(|e| InvoiceError::Internal(format!("cannot serialize invoice: {e}")))?;

        let file_name = invoice_file_name(
            data.header.recipient_name.as_deref(),
            data.key.period,
            self.writer.extension(),
        );
        info!(
            key = %data.key,
            items = data.line_items.len(),
            extra_rows = assembled.placement.expansion.extra_rows,
            bytes = bytes.len(),
            "assembled invoice"
        );
        Ok(GeneratedDocument {
            bytes,
            file_name,
            mime_type: self.writer.mime_type(),
        })
    }

    /// Fill a fresh template sheet without serializing it
    pub fn build_sheet<T: TemplateSource + ?Sized>(
        &self,
        template: &T,
        data: &InvoiceData,
    ) -> Result<AssembledSheet, InvoiceError> {
        check_ready(data)?;

        let mut sheet = template.load().map_err(|e| match e {
            TemplateError::NotFound(what) => {
                InvoiceError::NotFound(format!("invoice template {what}"))
            }
            other => InvoiceError::Internal(format!(
                "cannot load template {}: {other}",
                template.describe()
            )),
        })?;
        debug!(template = %template.describe(), "template loaded");

        // Markers are searched in the template as loaded; header values must not shadow them.
        let anchors = AnchorLocator::new(&self.layout).resolve(&sheet);
        write_header(&mut sheet, &data.header, &self.layout.header);

        let taxable = DetailBlock::new(anchors.detail_header.row, self.layout.taxable_capacity);
        let non_taxable = DetailBlock::new(
            anchors.non_taxable_header.row,
            self.layout.non_taxable_capacity,
        );

        let items = &data.line_items;
        let columns = &self.layout.columns;
        let expansion = expand_block(&mut sheet, &taxable, items.len());
        write_detail_rows(&mut sheet, taxable.first_data_row(), items, columns);
        let taxable_subtotal_row =
            write_taxable_subtotal(&mut sheet, &taxable, &expansion, items.len(), columns);
        let non_taxable_subtotal_row =
            write_non_taxable_subtotal(&mut sheet, &non_taxable, &expansion, columns);

        sheet.force_recalculation = true;

        Ok(AssembledSheet {
            sheet,
            placement: Placement {
                anchors,
                taxable,
                non_taxable,
                expansion,
                taxable_subtotal_row,
                non_taxable_subtotal_row,
            },
        })
    }
}

/// Preconditions checked before any template work
fn check_ready(data: &InvoiceData) -> Result<(), InvoiceError> {
    let pending: Vec<&str> = data.unapproved_tasks().map(|t| t.id.as_str()).collect();
    if !pending.is_empty() {
        return Err(InvoiceError::Conflict(format!(
            "{} task(s) for {} are not approved: {}",
            pending.len(),
            data.key,
            pending.join(", ")
        )));
    }
    if data.line_items.is_empty() {
        return Err(InvoiceError::NotFound(format!(
            "no billable line items for {}",
            data.key
        )));
    }
    Ok(())
}

fn write_header(sheet: &mut Sheet, header: &HeaderFacts, cells: &HeaderCells) {
    let fields: [(CellAddress, &Option<String>); 11] = [
        (cells.recipient_name, &header.recipient_name),
        (cells.recipient_postal_code, &header.recipient_postal_code),
        (cells.recipient_address, &header.recipient_address),
        (cells.recipient_phone, &header.recipient_phone),
        (cells.issue_date, &header.issue_date),
        (cells.period, &header.period),
        (cells.bank_name, &header.bank_name),
        (cells.bank_branch, &header.bank_branch),
        (cells.account_type, &header.account_type),
        (cells.account_number, &header.account_number),
        (cells.account_holder, &header.account_holder),
    ];
    for (address, value) in fields {
        let value = match value {
            Some(text) => CellValue::Text(text.clone()),
            None => CellValue::Empty,
        };
        sheet.set_value(address.row, address.col, value);
    }
}
