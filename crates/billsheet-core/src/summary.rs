//! Monthly summaries
//!
//! A `MonthlySummary` records the period-level totals of an issued invoice.
//! It is written once per (secretary, period) and overwritten on re-issue.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{InvoiceKey, LineItem, Period, SecretaryId, Task};

/// Lifecycle marker stored with a summary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryStatus {
    /// Totals recorded but the invoice has not been issued
    Draft,
    /// The invoice document was issued with these totals
    Finalized,
}

/// Totals computed in memory from one invoice's data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SummaryTotals {
    pub total_fee: Decimal,
    pub task_count: u32,
    pub total_minutes: u64,
}

impl SummaryTotals {
    /// Fee from the line items; count and minutes from the tasks
    pub fn compute(line_items: &[LineItem], tasks: &[Task]) -> Self {
        Self {
            total_fee: line_items.iter().map(LineItem::fee).sum(),
            task_count: saturating_count(tasks.len()),
            total_minutes: tasks.iter().map(|t| u64::from(t.work_minutes)).sum(),
        }
    }
}

fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Persisted period-level totals, keyed by (secretary, period)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub secretary_id: SecretaryId,
    pub period: Period,
    pub total_fee: Decimal,
    pub task_count: u32,
    pub total_minutes: u64,
    pub finalized_at: Option<DateTime<Utc>>,
    pub status: SummaryStatus,
}

impl MonthlySummary {
    /// A finalized summary stamped with `at`
    pub fn finalized(key: &InvoiceKey, totals: SummaryTotals, at: DateTime<Utc>) -> Self {
        Self {
            secretary_id: key.secretary_id.clone(),
            period: key.period,
            total_fee: totals.total_fee,
            task_count: totals.task_count,
            total_minutes: totals.total_minutes,
            finalized_at: Some(at),
            status: SummaryStatus::Finalized,
        }
    }

    pub fn key(&self) -> InvoiceKey {
        InvoiceKey::new(self.secretary_id.clone(), self.period)
    }
}
