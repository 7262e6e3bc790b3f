//! Output data model for one extraction run.
//!
//! All monetary values are canonical sign-prefixed strings (`$123.45`,
//! `-$123.45`); no arithmetic is ever performed on them.

use serde::{Deserialize, Serialize};

/// A child charge attached to a parent keyword entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub amount: String,
    pub keyword: String,
    pub name: String,
    pub ukey: String,
    pub inline_context: String,
    pub parent_keyword: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
}

/// A parent keyword entry with its extracted value and ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentEntry {
    pub amount: String,
    pub keyword: String,
    pub name: String,
    pub ukey: String,
    pub inline_context: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_keys: Vec<ChildEntry>,
}

/// One located contact and every charge associated with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub phone: String,
    pub name: String,
    #[serde(default)]
    pub money_amounts: Vec<ParentEntry>,
}

/// Kind of a bill-summary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFieldKind {
    /// Account/invoice/period/date fields using line post-processing.
    BillingDetail,
    /// Monetary fields using the currency patterns.
    MoneyAmount,
}

/// A field extracted from the bill-summary page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryField {
    pub sentence: String,
    pub name: String,
    pub ukey: String,
    pub amount: String,
    #[serde(default)]
    pub is_child: bool,
    pub inline_context: String,
    pub page: u32,
    #[serde(rename = "type")]
    pub kind: SummaryFieldKind,
}

/// A late fee found in the account-level charges section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateFeeEntry {
    pub amount: String,
    pub sentence: String,
    pub inline_context: String,
    pub page: u32,
}

/// Outcome of the account-level charges scan. The section being present but
/// empty is distinct from the section not existing at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "entries", rename_all = "snake_case")]
pub enum AccountCharges {
    /// No page in range carries the section marker.
    #[default]
    SectionMissing,
    /// The section exists but yielded no late-fee values.
    NoLateFees,
    /// Late fees found in the section.
    Found(Vec<LateFeeEntry>),
}

/// One ledger line from the previous-balance section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub amount: String,
    /// Nearest date after the keyword, verbatim; empty when none was found.
    pub date: String,
    /// Nearest phone-shaped token after the keyword; empty when none.
    pub contact: String,
    pub sentence: String,
    pub name: String,
    pub ukey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default)]
    pub is_child: bool,
    #[serde(default)]
    pub include_contact: bool,
    pub inline_context: String,
    pub page: u32,
}

/// Document-level results merged alongside the contact records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_charges: Option<String>,
    #[serde(default)]
    pub money_amounts: Vec<SummaryField>,
    #[serde(default)]
    pub late_fees: AccountCharges,
    #[serde(default)]
    pub previous_balance: Vec<BalanceEntry>,
}

/// The assembled result of one extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub provider: String,
    pub total_pages: u32,
    pub contacts_found: usize,
    /// Contacts that yielded at least one charge.
    pub contacts_with_charges: usize,
    pub entries: Vec<ContactRecord>,
    pub summary: DocumentSummary,
}
