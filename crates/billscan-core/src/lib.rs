//! Core library for keyword-driven carrier bill extraction.
//!
//! This crate provides:
//! - provider keyword configuration with built-in fallbacks
//! - contact location (phone/name pairs) in the bill text layer
//! - the keyword-anchored field association engine
//! - document-level scans (bill summary, late fees, previous balance)
//! - a PDF text source and a record store keyed by account/invoice

pub mod error;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod store;

pub use error::{BillscanError, Result};
pub use extract::{BillScanner, Contact, SearchSpec};
pub use models::config::ProviderSettings;
pub use models::record::{ContactRecord, DocumentSummary, ExtractionOutput};
pub use pdf::{PageTextSource, PdfTextSource, TextPages, parse_page_range};
pub use store::{JsonFileStore, MemoryStore, RecordStore, SaveOutcome};
