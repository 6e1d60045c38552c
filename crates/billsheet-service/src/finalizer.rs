//! Summary finalization after a successful issue

use billsheet_core::{InvoiceData, MonthlySummary, SummaryTotals};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::store::{StoreError, SummaryStore};

/// Records the period totals of an issued invoice
pub struct SummaryFinalizer<'a, S: SummaryStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SummaryStore + ?Sized> SummaryFinalizer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Compute the totals in memory and upsert a finalized summary stamped
    /// with `at`, in a transaction of its own.
    pub fn finalize(
        &self,
        data: &InvoiceData,
        at: DateTime<Utc>,
    ) -> Result<MonthlySummary, StoreError> {
        let totals = SummaryTotals::compute(&data.line_items, &data.tasks);
        let summary = MonthlySummary::finalized(&data.key, totals, at);

        let mut tx = self.store.begin()?;
        tx.upsert(summary.clone())?;
        tx.commit()?;

        debug!(
            key = %data.key,
            total_fee = %summary.total_fee,
            tasks = summary.task_count,
            minutes = summary.total_minutes,
            "summary finalized"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySummaryStore;
    use billsheet_core::{InvoiceKey, LineItem, Period, SummaryStatus, Task};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn stores_totals_for_the_period() {
        let at = Utc.with_ymd_and_hms(2026, 10, 1, 8, 30, 0).unwrap();
        let mut data = InvoiceData::new(InvoiceKey::new("s-9", Period::new(2026, 9).unwrap()));
        data.line_items = vec![
            LineItem::new("c-1").minutes(90).rate(dec!(2000)),
            LineItem::new("c-2").minutes(20).rate(dec!(1000)),
            LineItem::new("c-3").minutes(600),
        ];
        data.tasks = vec![
            Task::new("t-1", "s-9").work_minutes(90).approved(at),
            Task::new("t-2", "s-9").work_minutes(20).approved(at),
        ];

        let store = MemorySummaryStore::new();
        let summary = SummaryFinalizer::new(&store).finalize(&data, at).unwrap();

        // 3000 + 333 (333.33 rounded) + 0 for the row without a rate
        assert_eq!(summary.total_fee, dec!(3333));
        assert_eq!(summary.task_count, 2);
        assert_eq!(summary.total_minutes, 110);
        assert_eq!(summary.finalized_at, Some(at));
        assert_eq!(summary.status, SummaryStatus::Finalized);
        assert_eq!(store.get(&data.key).unwrap(), Some(summary));
    }
}
