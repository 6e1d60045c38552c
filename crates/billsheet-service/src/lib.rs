//! # billsheet-service
//!
//! Invoice workflows on top of the render crate.
//!
//! - [`InvoiceService::preview`] builds a document and nothing else
//! - [`InvoiceService::issue`] builds a document and records the monthly
//!   summary; the document is discarded if that write fails
//!
//! Data comes from an [`InvoiceSource`], summaries go to a [`SummaryStore`].
//! In-memory and JSON-file implementations of both are provided.
//!
//! ## Example
//!
//! ```rust,ignore
//! use billsheet_service::{InvoiceService, JsonInvoiceSource, JsonSummaryStore};
//!
//! let service = InvoiceService::new(
//!     JsonInvoiceSource::new("invoices.json"),
//!     JsonSummaryStore::new("summaries.json"),
//! );
//! let issued = service.issue(&key)?;
//! std::fs::write(&issued.document.file_name, &issued.document.bytes)?;
//! ```

pub mod finalizer;
pub mod service;
pub mod source;
pub mod store;

pub use finalizer::SummaryFinalizer;
pub use service::{InvoiceService, IssuedInvoice, ISSUE_DATE_FORMAT};
pub use source::{InvoiceFile, InvoiceSource, JsonInvoiceSource, MemoryInvoiceSource, SourceError};
pub use store::{JsonSummaryStore, MemorySummaryStore, StoreError, SummaryStore, SummaryTransaction};
