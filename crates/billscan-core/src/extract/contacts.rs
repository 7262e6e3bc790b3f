//! Contact location: phone/name pairs in page text.

use tracing::debug;

use super::patterns::{CONTACT_NAME, PHONE, collapse_whitespace, window};

/// Characters inspected after a phone match for a name or exclusion term.
const NAME_LOOKAHEAD: usize = 100;

/// A phone/name pair located in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub phone: String,
    pub name: String,
}

/// Scan one page's text for phone-number/name pairs.
///
/// A phone match is discarded when any exclusion term appears
/// case-insensitively in the 100 characters that follow it; duplicates are
/// not collapsed here.
pub fn locate_contacts(page_text: &str, exclude_keywords: &[String]) -> Vec<Contact> {
    let mut contacts = Vec::new();

    for phone_match in PHONE.find_iter(page_text) {
        let digits: String = phone_match
            .as_str()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if digits.len() != 10 {
            continue;
        }

        let lookahead = window(page_text, phone_match.end(), NAME_LOOKAHEAD);
        let lookahead_lower = lookahead.to_lowercase();
        if exclude_keywords
            .iter()
            .any(|term| lookahead_lower.contains(&term.to_lowercase()))
        {
            debug!(phone = phone_match.as_str(), "phone match near an excluded term, skipping");
            continue;
        }

        if let Some(name_match) = CONTACT_NAME.find(lookahead) {
            contacts.push(Contact {
                phone: phone_match.as_str().to_string(),
                name: collapse_whitespace(name_match.as_str()),
            });
        }
    }

    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn excludes() -> Vec<String> {
        ["in", "pay", "auto", "device"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_locates_phone_and_name() {
        let text = "Line summary\n555-123-4567\nJane Doe\nMonthly Charges $75.00";
        let contacts = locate_contacts(text, &excludes());
        assert_eq!(
            contacts,
            vec![Contact {
                phone: "555-123-4567".to_string(),
                name: "Jane Doe".to_string(),
            }]
        );
    }

    #[test]
    fn test_exclusion_term_discards_match() {
        // "device" within the lookahead disqualifies the pair.
        let text = "555-123-4567 device payment Jane Doe";
        assert!(locate_contacts(text, &excludes()).is_empty());
    }

    #[test]
    fn test_no_name_after_phone() {
        let text = "555-123-4567 1234 5678";
        assert!(locate_contacts(text, &excludes()).is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let text = "555-123-4567 John Smith ... 555-123-4567 John Smith";
        let contacts = locate_contacts(text, &[]);
        assert_eq!(contacts.len(), 2);
    }

    #[test]
    fn test_name_collapses_whitespace() {
        let text = "555-123-4567\nJane\nDoe";
        let contacts = locate_contacts(text, &[]);
        assert_eq!(contacts[0].name, "Jane Doe");
    }
}
