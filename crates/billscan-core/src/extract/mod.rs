//! Extraction pipeline: document validation, contact location, field
//! association, and assembly of the final record.

pub mod contacts;
pub mod engine;
pub mod organize;
pub mod patterns;
pub mod spec;
pub mod summary;

pub use contacts::Contact;
pub use spec::{SearchSpec, normalize_keywords};

use tracing::{debug, info, warn};

use crate::error::{PageError, Result, ValidationError};
use crate::models::config::{KeywordDef, ProviderSettings};
use crate::models::record::{ContactRecord, DocumentSummary, ExtractionOutput};
use crate::pdf::{PageTextSource, parse_page_range};

/// Leading pages checked for a provider-identifying marker.
const MARKER_PAGE_LIMIT: u32 = 3;

/// One provider's extraction pipeline.
///
/// A scanner is cheap to construct per request; the settings are read-only
/// for the duration of a scan, so repeated runs over the same input yield
/// identical output.
pub struct BillScanner {
    provider: String,
    settings: ProviderSettings,
}

impl BillScanner {
    pub fn new(provider: impl Into<String>, settings: ProviderSettings) -> Self {
        Self {
            provider: provider.into(),
            settings,
        }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Run a full extraction over the document.
    ///
    /// `page_spec` narrows contact location and the document-level scans;
    /// the association engine always scans the whole document. A non-empty
    /// `keyword_override` replaces the configured required keywords with
    /// bare terms.
    pub fn scan(
        &self,
        source: &dyn PageTextSource,
        page_spec: &str,
        keyword_override: &[String],
    ) -> Result<ExtractionOutput> {
        let total_pages = source.page_count();
        if total_pages == 0 {
            return Err(PageError::NoPages.into());
        }
        self.validate_document(source, total_pages)?;

        let pages = parse_page_range(page_spec, total_pages);
        if pages.is_empty() {
            return Err(ValidationError::EmptyPageRange.into());
        }

        let keywords: Vec<KeywordDef> = if keyword_override.is_empty() {
            self.settings.required_keywords.clone()
        } else {
            keyword_override
                .iter()
                .map(|term| KeywordDef::Plain(term.clone()))
                .collect()
        };
        let specs = normalize_keywords(&keywords);

        let contacts = self.locate_contacts(source, &pages);
        info!(provider = %self.provider, contacts = contacts.len(), "contacts located");

        let entries: Vec<ContactRecord> = contacts
            .iter()
            .map(|contact| {
                let found = engine::scan_contact(
                    source,
                    contact,
                    &specs,
                    &self.settings.dash_guard_ukeys,
                );
                organize::organize_contact(contact, &found)
            })
            .collect();
        let contacts_with_charges = entries
            .iter()
            .filter(|e| !e.money_amounts.is_empty())
            .count();

        let summary = self.build_summary(source, &pages);

        Ok(ExtractionOutput {
            provider: self.provider.clone(),
            total_pages,
            contacts_found: contacts.len(),
            contacts_with_charges,
            entries,
            summary,
        })
    }

    /// Reject documents carrying none of the provider's markers in their
    /// leading pages.
    fn validate_document(&self, source: &dyn PageTextSource, total_pages: u32) -> Result<()> {
        for page in 1..=total_pages.min(MARKER_PAGE_LIMIT) {
            let text = match source.page_text(page) {
                Ok(text) => text.to_lowercase(),
                Err(e) => {
                    warn!(page, "skipping unreadable page during validation: {e}");
                    continue;
                }
            };
            if self
                .settings
                .document_markers
                .iter()
                .any(|marker| text.contains(&marker.to_lowercase()))
            {
                debug!(page, "provider marker found");
                return Ok(());
            }
        }
        Err(ValidationError::UnrecognizedDocument {
            provider: self.provider.clone(),
        }
        .into())
    }

    fn locate_contacts(&self, source: &dyn PageTextSource, pages: &[u32]) -> Vec<Contact> {
        let mut contacts = Vec::new();
        for &page in pages {
            match source.page_text(page) {
                Ok(text) => contacts.extend(contacts::locate_contacts(
                    &text,
                    &self.settings.exclude_keywords,
                )),
                Err(e) => warn!(page, "skipping unreadable page while locating contacts: {e}"),
            }
        }
        contacts
    }

    fn build_summary(&self, source: &dyn PageTextSource, pages: &[u32]) -> DocumentSummary {
        let mut summary = DocumentSummary {
            late_fees: summary::scan_account_charges(source, pages, &self.settings),
            previous_balance: summary::scan_previous_balance(source, pages, &self.settings),
            ..DocumentSummary::default()
        };

        // Billing details and the total get promoted to dedicated fields;
        // everything else stays in the monetary list.
        for field in summary::scan_bill_summary(source, pages, &self.settings) {
            match field.ukey.as_str() {
                "invoice" => summary.invoice = Some(field.amount),
                "account" => summary.account = Some(field.amount),
                "billing_period" => summary.billing_period = Some(field.amount),
                "due_date" => summary.due_date = Some(field.amount),
                "total_charges" => summary.total_charges = Some(field.amount),
                _ => summary.money_amounts.push(field),
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::AccountCharges;
    use crate::pdf::TextPages;
    use pretty_assertions::assert_eq;

    fn scanner() -> BillScanner {
        BillScanner::new("verizon", ProviderSettings::default())
    }

    fn bill() -> TextPages {
        TextPages(vec![
            concat!(
                "verizon.com/business\n",
                "Bill summary\n",
                "Account: 920-123456-0001\n",
                "Total Amount Due $350.00\n",
            )
            .to_string(),
            concat!(
                "Charges by line\n",
                "555-123-4567\nJane Doe\n",
                "Monthly Charges $75.00\n",
            )
            .to_string(),
        ])
    }

    #[test]
    fn test_end_to_end_contact_extraction() {
        let output = scanner().scan(&bill(), "", &[]).unwrap();

        assert_eq!(output.total_pages, 2);
        assert_eq!(output.contacts_found, 1);
        assert_eq!(output.contacts_with_charges, 1);

        let record = &output.entries[0];
        assert_eq!(record.phone, "555-123-4567");
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.money_amounts.len(), 1);
        assert_eq!(record.money_amounts[0].ukey, "monthly");
        assert_eq!(record.money_amounts[0].amount, "$75.00");

        assert_eq!(output.summary.account.as_deref(), Some("920-123456-0001"));
        assert_eq!(output.summary.late_fees, AccountCharges::SectionMissing);
    }

    #[test]
    fn test_unrecognized_document_is_rejected() {
        let source = TextPages(vec!["some other carrier's bill".to_string()]);
        let err = scanner().scan(&source, "", &[]).unwrap_err();
        assert!(err.to_string().contains("does not look like"));
    }

    #[test]
    fn test_empty_page_range_is_rejected() {
        let err = scanner().scan(&bill(), "9-12", &[]).unwrap_err();
        assert!(err.to_string().contains("no valid pages"));
    }

    #[test]
    fn test_page_range_narrows_contact_location() {
        // Contacts sit on page 2; restricting to page 1 finds none, but the
        // association engine still requires a located contact to scan.
        let output = scanner().scan(&bill(), "1", &[]).unwrap();
        assert_eq!(output.contacts_found, 0);
        assert!(output.entries.is_empty());
    }

    #[test]
    fn test_keyword_override_replaces_configured_terms() {
        let output = scanner()
            .scan(&bill(), "", &["Monthly Charges".to_string()])
            .unwrap();
        assert_eq!(output.entries[0].money_amounts[0].ukey, "monthly_charges");
    }

    #[test]
    fn test_scan_is_idempotent() {
        let first = scanner().scan(&bill(), "", &[]).unwrap();
        let second = scanner().scan(&bill(), "", &[]).unwrap();
        assert_eq!(first, second);
    }
}
