//! Preview and issue workflows
//!
//! Both share the same assembler. Issuing additionally records the monthly
//! summary; the document is only handed out once that write has committed.

use billsheet_core::{GeneratedDocument, InvoiceData, InvoiceError, InvoiceKey, MonthlySummary};
use billsheet_render::{EmbeddedTemplate, InvoiceAssembler, InvoiceLayout, TemplateSource};
use chrono::{Local, NaiveDate, Utc};
use tracing::{info, warn};

use crate::finalizer::SummaryFinalizer;
use crate::source::{InvoiceSource, SourceError};
use crate::store::SummaryStore;

/// Format of the default issue date
pub const ISSUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// An issued invoice and the summary recorded for it
#[derive(Clone, Debug, PartialEq)]
pub struct IssuedInvoice {
    pub document: GeneratedDocument,
    pub summary: MonthlySummary,
}

/// Generates invoices from a data source and a template
pub struct InvoiceService<D, S, T = EmbeddedTemplate>
where
    D: InvoiceSource,
    S: SummaryStore,
    T: TemplateSource,
{
    source: D,
    store: S,
    template: T,
    assembler: InvoiceAssembler,
    issue_date: Option<NaiveDate>,
}

impl<D, S> InvoiceService<D, S, EmbeddedTemplate>
where
    D: InvoiceSource,
    S: SummaryStore,
{
    /// Service using the built-in template and default layout
    pub fn new(source: D, store: S) -> Self {
        Self {
            source,
            store,
            template: EmbeddedTemplate,
            assembler: InvoiceAssembler::default(),
            issue_date: None,
        }
    }
}

impl<D, S, T> InvoiceService<D, S, T>
where
    D: InvoiceSource,
    S: SummaryStore,
    T: TemplateSource,
{
    /// Use another template
    pub fn template<U: TemplateSource>(self, template: U) -> InvoiceService<D, S, U> {
        InvoiceService {
            source: self.source,
            store: self.store,
            template,
            assembler: self.assembler,
            issue_date: self.issue_date,
        }
    }

    pub fn layout(mut self, layout: InvoiceLayout) -> Self {
        self.assembler = InvoiceAssembler::new(layout);
        self
    }

    /// Date printed when the data leaves the issue date empty; today if unset
    pub fn issue_date(mut self, date: NaiveDate) -> Self {
        self.issue_date = Some(date);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    /// Build the document without recording anything
    pub fn preview(&self, key: &InvoiceKey) -> Result<GeneratedDocument, InvoiceError> {
        let data = self.load(key)?;
        self.assembler.assemble(&self.template, &data)
    }

    /// Build the document and record its monthly summary.
    ///
    /// A failed summary write discards the document.
    pub fn issue(&self, key: &InvoiceKey) -> Result<IssuedInvoice, InvoiceError> {
        let data = self.load(key)?;
        let document = self.assembler.assemble(&self.template, &data)?;

        let summary = SummaryFinalizer::new(&self.store)
            .finalize(&data, Utc::now())
            .map_err(|e| {
                warn!(%key, error = %e, "summary write failed; document discarded");
                InvoiceError::Internal(format!("cannot record summary for {key}: {e}"))
            })?;

        info!(
            %key,
            file = %document.file_name,
            total_fee = %summary.total_fee,
            "invoice issued"
        );
        Ok(IssuedInvoice { document, summary })
    }

    fn load(&self, key: &InvoiceKey) -> Result<InvoiceData, InvoiceError> {
        let mut data = self.source.fetch(key).map_err(|e| match e {
            SourceError::Missing(_) => InvoiceError::NotFound(e.to_string()),
            other => InvoiceError::Internal(format!("cannot load invoice data: {other}")),
        })?;

        let given = data.header.issue_date.as_deref().filter(|d| !d.trim().is_empty());
        if given.is_none() {
            let date = self.issue_date.unwrap_or_else(|| Local::now().date_naive());
            data.header.issue_date = Some(date.format(ISSUE_DATE_FORMAT).to_string());
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryInvoiceSource;
    use crate::store::MemorySummaryStore;
    use billsheet_core::{LineItem, Period};
    use billsheet_render::{Sheet, TemplateFile};
    use pretty_assertions::assert_eq;

    fn key() -> InvoiceKey {
        InvoiceKey::new("s-1", Period::new(2026, 9).unwrap())
    }

    fn source() -> MemoryInvoiceSource {
        let mut data = InvoiceData::new(key());
        data.line_items = vec![LineItem::new("c-1").label("Acme").minutes(60)];
        MemoryInvoiceSource::new().with(data)
    }

    #[test]
    fn preview_does_not_record() {
        let service = InvoiceService::new(source(), MemorySummaryStore::new());
        let doc = service.preview(&key()).unwrap();

        assert!(doc.bytes.starts_with(b"PK"));
        assert!(service.store().list().unwrap().is_empty());
    }

    #[test]
    fn issue_records_a_summary() {
        let service = InvoiceService::new(source(), MemorySummaryStore::new());
        let issued = service.issue(&key()).unwrap();

        assert_eq!(service.store().get(&key()).unwrap(), Some(issued.summary));
    }

    #[test]
    fn unknown_key_is_not_found() {
        let service = InvoiceService::new(source(), MemorySummaryStore::new());
        let other = InvoiceKey::new("s-2", Period::new(2026, 9).unwrap());
        assert!(matches!(service.preview(&other), Err(InvoiceError::NotFound(_))));
    }

    #[test]
    fn empty_issue_date_is_filled() {
        let service = InvoiceService::new(source(), MemorySummaryStore::new())
            .issue_date(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap());
        let data = service.load(&key()).unwrap();
        assert_eq!(data.header.issue_date.as_deref(), Some("2026-10-05"));
    }

    #[test]
    fn blank_issue_date_is_filled() {
        let mut data = InvoiceData::new(key());
        data.header.issue_date = Some("  ".into());
        let service = InvoiceService::new(MemoryInvoiceSource::new().with(data), MemorySummaryStore::new())
            .issue_date(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap());
        assert_eq!(
            service.load(&key()).unwrap().header.issue_date.as_deref(),
            Some("2026-10-05")
        );
    }

    #[test]
    fn given_issue_date_is_kept() {
        let mut data = InvoiceData::new(key());
        data.header.issue_date = Some("2026/10/01".into());
        let service = InvoiceService::new(MemoryInvoiceSource::new().with(data), MemorySummaryStore::new())
            .issue_date(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap());
        assert_eq!(
            service.load(&key()).unwrap().header.issue_date.as_deref(),
            Some("2026/10/01")
        );
    }

    #[test]
    fn template_is_swappable() {
        let mut plain = Sheet::new("Plain");
        plain.set_value(1, 0, "Plain invoice");
        let service = InvoiceService::new(source(), MemorySummaryStore::new()).template(plain);
        assert!(service.preview(&key()).is_ok());

        let service = service.template(TemplateFile::new("/nonexistent/invoice.toml"));
        assert!(matches!(service.preview(&key()), Err(InvoiceError::NotFound(_))));
        assert!(matches!(service.issue(&key()), Err(InvoiceError::NotFound(_))));
        assert!(service.store().list().unwrap().is_empty());
    }
}
