use billsheet_core::{
    InvoiceData, InvoiceError, InvoiceKey, LineItem, MonthlySummary, Period, SummaryStatus, Task,
};
use billsheet_service::{
    InvoiceFile, InvoiceService, JsonInvoiceSource, JsonSummaryStore, MemoryInvoiceSource,
    MemorySummaryStore, StoreError, SummaryStore, SummaryTransaction,
};
use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn key() -> InvoiceKey {
    InvoiceKey::new("sec-42", Period::new(2026, 8).unwrap())
}

fn data() -> InvoiceData {
    let approved = Utc.with_ymd_and_hms(2026, 8, 31, 18, 0, 0).unwrap();
    let mut data = InvoiceData::new(key());
    data.header.recipient_name = Some("Hayashi Holdings".into());
    data.line_items = vec![
        LineItem::new("co-2").label("Nakamura Inc").rank("A").minutes(150).rate(dec!(4000)),
        LineItem::new("co-1").label("Ishii Ltd").rank("A").minutes(45).rate(dec!(4000)),
    ];
    data.tasks = vec![
        Task::new("t-1", "sec-42").company("co-1").work_minutes(45).approved(approved),
        Task::new("t-2", "sec-42").company("co-2").work_minutes(150).approved(approved),
    ];
    data
}

/// Accepts writes but cannot commit them
struct FailingStore;

struct FailingTransaction;

impl SummaryTransaction for FailingTransaction {
    fn upsert(&mut self, _summary: MonthlySummary) -> Result<(), StoreError> {
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection reset".into()))
    }
}

impl SummaryStore for FailingStore {
    fn begin(&self) -> Result<Box<dyn SummaryTransaction + '_>, StoreError> {
        Ok(Box::new(FailingTransaction))
    }

    fn list(&self) -> Result<Vec<MonthlySummary>, StoreError> {
        Ok(Vec::new())
    }
}

#[test]
fn issue_returns_document_and_summary() {
    let service = InvoiceService::new(MemoryInvoiceSource::new().with(data()), MemorySummaryStore::new());
    let issued = service.issue(&key()).unwrap();

    assert_eq!(issued.document.file_name, "【Invoice】Hayashi Holdings_2026-08.xlsx");
    assert!(issued.document.bytes.starts_with(b"PK"));

    // 10000 + 3000
    assert_eq!(issued.summary.total_fee, dec!(13000));
    assert_eq!(issued.summary.task_count, 2);
    assert_eq!(issued.summary.total_minutes, 195);
    assert_eq!(issued.summary.status, SummaryStatus::Finalized);
    assert!(issued.summary.finalized_at.is_some());
}

#[test]
fn failed_summary_write_discards_the_document() {
    let service = InvoiceService::new(MemoryInvoiceSource::new().with(data()), FailingStore);

    let err = service.issue(&key()).unwrap_err();
    assert!(matches!(&err, InvoiceError::Internal(msg) if msg.contains("connection reset")));

    // Preview does not touch the store.
    assert!(service.preview(&key()).is_ok());
}

#[test]
fn unapproved_work_blocks_issue_and_summary() {
    let mut pending = data();
    pending.tasks.push(Task::new("t-3", "sec-42").work_minutes(30));
    let service = InvoiceService::new(MemoryInvoiceSource::new().with(pending), MemorySummaryStore::new());

    assert!(matches!(service.issue(&key()), Err(InvoiceError::Conflict(_))));
    assert!(service.store().list().unwrap().is_empty());
}

#[test]
fn no_line_items_is_not_found() {
    let mut empty = data();
    empty.line_items.clear();
    let service = InvoiceService::new(MemoryInvoiceSource::new().with(empty), MemorySummaryStore::new());

    assert!(matches!(service.preview(&key()), Err(InvoiceError::NotFound(_))));
    assert!(matches!(service.issue(&key()), Err(InvoiceError::NotFound(_))));
    assert!(service.store().list().unwrap().is_empty());
}

#[test]
fn reissue_overwrites_the_summary() {
    let source = MemoryInvoiceSource::new().with(data());
    let store = MemorySummaryStore::new();
    let service = InvoiceService::new(&source, &store);
    service.issue(&key()).unwrap();

    let mut corrected = data();
    corrected.line_items.pop();
    let source = MemoryInvoiceSource::new().with(corrected);
    let service = InvoiceService::new(&source, &store);
    service.issue(&key()).unwrap();

    let summaries = store.list().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_fee, dec!(10000));
}

#[test]
fn json_files_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let invoices = dir.path().join("invoices.json");
    let summaries = dir.path().join("summaries.json");
    let file = InvoiceFile {
        invoices: vec![data()],
    };
    std::fs::write(&invoices, serde_json::to_string_pretty(&file).unwrap()).unwrap();

    let service = InvoiceService::new(
        JsonInvoiceSource::new(&invoices),
        JsonSummaryStore::new(&summaries),
    )
    .issue_date(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    let issued = service.issue(&key()).unwrap();

    let stored = JsonSummaryStore::new(&summaries).list().unwrap();
    assert_eq!(stored, vec![issued.summary]);
}
