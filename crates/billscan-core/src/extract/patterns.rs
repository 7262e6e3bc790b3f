//! Regex tables and text helpers for bill field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Dollar amount without a sign: $75.00, $1,234.56
    pub static ref MONEY: Regex = Regex::new(
        r"\$[\d,]+\.?\d*"
    ).unwrap();

    /// Dollar amount with an optional leading sign: -$12.00
    pub static ref SIGNED_MONEY: Regex = Regex::new(
        r"-?\$[\d,]+\.?\d*"
    ).unwrap();

    /// Amount that may be parenthesized ((123.45)) or bare; used only for
    /// the signed-exempt summary fields (balance_forward, total_charges).
    pub static ref PAREN_MONEY: Regex = Regex::new(
        r"\(\$?[\d,]+\.?\d*\)|-?\$?[\d,]+\.?\d*"
    ).unwrap();

    /// Installment marker: "3 of 36"
    pub static ref INSTALLMENT: Regex = Regex::new(
        r"(?i)\d+\s+of\s+\d+"
    ).unwrap();

    /// Promotion expiration marker: "Expires on 12/31/25"
    pub static ref EXPIRATION: Regex = Regex::new(
        r"(?i)Expires\s+on\s+\d{1,2}/\d{1,2}/\d{2,4}"
    ).unwrap();

    /// Billing date range: "3/1 - 3/31"
    pub static ref DATE_RANGE: Regex = Regex::new(
        r"\d{1,2}/\d{1,2}\s*-\s*\d{1,2}/\d{1,2}"
    ).unwrap();

    /// First month/day token of a date range, used for child ordering.
    pub static ref MONTH_DAY: Regex = Regex::new(
        r"(\d{1,2}/\d{1,2})"
    ).unwrap();

    /// Ten-digit phone number: 555-123-4567
    pub static ref PHONE: Regex = Regex::new(
        r"\d{3}-\d{3}-\d{4}"
    ).unwrap();

    /// Capitalized two-token person name: "Jane Doe"
    pub static ref CONTACT_NAME: Regex = Regex::new(
        r"[A-Z][a-z]+\s+[A-Z][a-z]+"
    ).unwrap();

    /// Dates in numeric or abbreviated-month form, for the previous-balance
    /// ledger: 1/15/24, 1-15-2024, "Jan 15, 2024"
    pub static ref DATE_ANY: Regex = Regex::new(
        r"\b(?:\d{1,2}/\d{1,2}/\d{2,4}|\d{1,2}-\d{1,2}-\d{2,4}|[A-Za-z]{3}\s+\d{1,2},?\s+\d{4})\b"
    ).unwrap();

    // Billing-detail value patterns (bill-summary page).
    pub static ref ACCOUNT_TOKEN: Regex = Regex::new(
        r"(\d+(?:[-\s]\d+)*)"
    ).unwrap();

    pub static ref INVOICE_TOKEN: Regex = Regex::new(
        r"(?i)([A-Z0-9\-]+)"
    ).unwrap();

    pub static ref PERIOD_LONG: Regex = Regex::new(
        r"([A-Za-z]{3}\s+\d{1,2},?\s+\d{4}\s*[-\u{2013}\u{2014}]\s*[A-Za-z]{3}\s+\d{1,2},?\s+\d{4})"
    ).unwrap();

    pub static ref PERIOD_NUMERIC: Regex = Regex::new(
        r"(\d{1,2}/\d{1,2}/\d{4}\s*[-\u{2013}\u{2014}]\s*\d{1,2}/\d{1,2}/\d{4})"
    ).unwrap();

    pub static ref DATE_LONG: Regex = Regex::new(
        r"([A-Za-z]{3}\s+\d{1,2},?\s+\d{4})"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"(\d{1,2}/\d{1,2}/\d{4})"
    ).unwrap();

    /// Punctuation stripped from the front of billing-detail windows.
    pub static ref LEADING_PUNCT: Regex = Regex::new(
        r"^[\s:#\-\u{2013}\u{2014}]+"
    ).unwrap();

    /// Phrasing that stands in for a zero previous balance.
    pub static ref NO_PAYMENT: Regex = Regex::new(
        r"(?i)no\s+payment\s+received|not\s+available|\$0\.00"
    ).unwrap();

    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Normalize a raw monetary match to canonical sign-prefixed form:
/// `50.00` -> `$50.00`, `-50.00` -> `-$50.00`, `($50.00)` -> `-$50.00`.
pub fn normalize_amount(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        let inner = inner.trim();
        if inner.starts_with('$') {
            format!("-{inner}")
        } else {
            format!("-${inner}")
        }
    } else if let Some(rest) = raw.strip_prefix('-') {
        if rest.starts_with('$') {
            raw.to_string()
        } else {
            format!("-${rest}")
        }
    } else if raw.starts_with('$') {
        raw.to_string()
    } else {
        format!("${raw}")
    }
}

/// Slice up to `len` bytes of `text` starting at `start`, clamped to the
/// text length and backed off to a char boundary.
pub fn window(text: &str, start: usize, len: usize) -> &str {
    if start >= text.len() {
        return "";
    }
    let mut end = start.saturating_add(len).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end]
}
