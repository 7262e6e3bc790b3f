//! Error types for the billscan-core library.

use thiserror::Error;

/// Main error type for the billscan library.
#[derive(Error, Debug)]
pub enum BillscanError {
    /// Document text layer error.
    #[error("page error: {0}")]
    Page(#[from] PageError),

    /// The request was rejected before scanning.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Record store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from the document text layer.
#[derive(Error, Debug)]
pub enum PageError {
    /// Failed to open/parse the document.
    #[error("failed to parse document: {0}")]
    Parse(String),

    /// Failed to decode the text layer.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The document is encrypted and cannot be processed.
    #[error("document is encrypted")]
    Encrypted,

    /// The document is empty or has no pages.
    #[error("document has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Request-level validation failures, reported to the caller unretried.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The document carries none of the provider's identifying markers.
    #[error("document does not look like a {provider} bill")]
    UnrecognizedDocument { provider: String },

    /// The page specification selected no valid pages.
    #[error("no valid pages in the requested range")]
    EmptyPageRange,
}

/// Errors from the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failed.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for the billscan library.
pub type Result<T> = std::result::Result<T, BillscanError>;
