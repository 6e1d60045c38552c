//! # billsheet-core
//!
//! Core domain model for the billsheet invoice generator.
//!
//! This crate provides:
//! - Domain types: `LineItem`, `HeaderFacts`, `Task`, `Period`, `InvoiceData`
//! - The finished artifact: `GeneratedDocument`
//! - Monthly summaries: `MonthlySummary`, `SummaryTotals`
//! - The error taxonomy reported at the service boundary: `InvoiceError`
//!
//! ## Example
//!
//! ```rust
//! use billsheet_core::{sort_line_items, LineItem};
//! use rust_decimal::Decimal;
//!
//! let mut items = vec![
//!     LineItem::new("c-2").label("Zenith Ltd").rank("A").minutes(125),
//!     LineItem::new("c-1").label("Acme Corp").rank("B").minutes(90).rate(Decimal::from(3000)),
//! ];
//! sort_line_items(&mut items);
//!
//! assert_eq!(items[0].label.as_deref(), Some("Acme Corp"));
//! assert_eq!(items[1].hours(), 2);
//! assert_eq!(items[1].remainder_minutes(), 5);
//! ```

pub mod summary;

pub use summary::{MonthlySummary, SummaryStatus, SummaryTotals};

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a secretary (the invoicing party)
pub type SecretaryId = String;

/// Unique identifier for a client company
pub type CompanyId = String;

/// Unique identifier for a task
pub type TaskId = String;

/// MIME type of the generated workbook
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// ============================================================================
// Period
// ============================================================================

/// A billing period: one calendar month
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::Month(month));
        }
        if !(1..=9999).contains(&year) {
            return Err(PeriodError::Year(year));
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    /// Parses `YYYY-MM` (a `YYYY/MM` separator is accepted too)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (year, month) = s
            .split_once(['-', '/'])
            .ok_or_else(|| PeriodError::Syntax(s.to_string()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| PeriodError::Syntax(s.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| PeriodError::Syntax(s.to_string()))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

// ============================================================================
// Line Items
// ============================================================================

/// One aggregated billing row: (company × rank) or (secretary × rank)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Company or secretary this row is billed for
    pub owner_id: String,
    /// Display label (company name or rank name)
    #[serde(default)]
    pub label: Option<String>,
    /// Rank name
    #[serde(default)]
    pub rank: Option<String>,
    /// Total minutes worked
    pub minutes: u32,
    /// Hourly rate; rows without a rate leave the rate cell untouched
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
}

impl LineItem {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            label: None,
            rank: None,
            minutes: 0,
            hourly_rate: None,
        }
    }

    /// Set the display label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the rank name
    pub fn rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = Some(rank.into());
        self
    }

    /// Set total minutes worked
    pub fn minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    /// Set the hourly rate
    pub fn rate(mut self, rate: Decimal) -> Self {
        self.hourly_rate = Some(rate);
        self
    }

    /// Whole hours of the worked time
    pub fn hours(&self) -> u32 {
        self.minutes / 60
    }

    /// Minutes left over after whole hours
    pub fn remainder_minutes(&self) -> u32 {
        self.minutes % 60
    }

    /// Fee for this row: `rate × minutes / 60` rounded to whole units.
    ///
    /// Matches the spreadsheet's `ROUND(rate*(hours+minutes/60),0)`, which
    /// rounds half away from zero. Rows without a rate bill nothing.
    pub fn fee(&self) -> Decimal {
        match self.hourly_rate {
            Some(rate) => (rate * Decimal::from(self.minutes) / Decimal::from(60))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            None => Decimal::ZERO,
        }
    }
}

/// Sort line items by label then rank, missing values last.
///
/// The sort is stable, so items with equal keys keep their input order and
/// sorting an already sorted list is a no-op.
pub fn sort_line_items(items: &mut [LineItem]) {
    items.sort_by(compare_line_items);
}

/// Ordering used by [`sort_line_items`]
pub fn compare_line_items(a: &LineItem, b: &LineItem) -> Ordering {
    nulls_last(a.label.as_deref(), b.label.as_deref())
        .then_with(|| nulls_last(a.rank.as_deref(), b.rank.as_deref()))
}

fn nulls_last(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ============================================================================
// Header Facts
// ============================================================================

/// Static per-document fields printed above the detail block
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderFacts {
    pub recipient_name: Option<String>,
    pub recipient_address: Option<String>,
    pub recipient_postal_code: Option<String>,
    pub recipient_phone: Option<String>,
    pub bank_name: Option<String>,
    pub bank_branch: Option<String>,
    pub account_type: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    /// Target period as shown on the document
    pub period: Option<String>,
    pub issue_date: Option<String>,
}

// ============================================================================
// Tasks
// ============================================================================

/// A unit of recorded work; only its approval state and minutes matter here
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub secretary_id: SecretaryId,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    pub work_minutes: u32,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, secretary_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secretary_id: secretary_id.into(),
            company_id: None,
            work_minutes: 0,
            approved_at: None,
        }
    }

    pub fn company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }

    pub fn work_minutes(mut self, minutes: u32) -> Self {
        self.work_minutes = minutes;
        self
    }

    pub fn approved(mut self, at: DateTime<Utc>) -> Self {
        self.approved_at = Some(at);
        self
    }

    pub fn is_approved(&self) -> bool {
        self.approved_at.is_some()
    }
}

// ============================================================================
// Invoice Input
// ============================================================================

/// Identifies one invoice: a secretary's billing for one period
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvoiceKey {
    pub secretary_id: SecretaryId,
    pub period: Period,
}

impl InvoiceKey {
    pub fn new(secretary_id: impl Into<String>, period: Period) -> Self {
        Self {
            secretary_id: secretary_id.into(),
            period,
        }
    }
}

impl fmt::Display for InvoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.secretary_id, self.period)
    }
}

/// Everything one document generation reads from the data layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    pub key: InvoiceKey,
    #[serde(default)]
    pub header: HeaderFacts,
    /// Sorted with [`sort_line_items`]
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl InvoiceData {
    pub fn new(key: InvoiceKey) -> Self {
        Self {
            key,
            header: HeaderFacts::default(),
            line_items: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Tasks that have not been approved yet
    pub fn unapproved_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.is_approved())
    }
}

// ============================================================================
// Generated Document
// ============================================================================

/// A finished, serialized invoice
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
}

/// Build the download name `【Invoice】{recipient}_{YYYY}-{MM}.{ext}`.
///
/// A missing or blank recipient becomes `secretary`. Characters that are not
/// allowed in file names on common platforms are replaced with `_`.
pub fn invoice_file_name(recipient: Option<&str>, period: Period, extension: &str) -> String {
    let recipient = recipient
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("secretary");
    sanitize_file_name(&format!("【Invoice】{recipient}_{period}.{extension}"))
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

// ============================================================================
// Errors
// ============================================================================

/// Error reported by document generation
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Invalid period text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("expected YYYY-MM, got '{0}'")]
    Syntax(String),

    #[error("month out of range: {0}")]
    Month(u32),

    #[error("year out of range: {0}")]
    Year(i32),
}

// ============================================================================
// Tests
// ============================================================================
