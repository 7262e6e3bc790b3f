//! Field association: keyword occurrences to nearby monetary values.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use tracing::warn;

use super::contacts::Contact;
use super::patterns::{
    DATE_RANGE, EXPIRATION, INSTALLMENT, MONEY, SIGNED_MONEY, collapse_whitespace,
    normalize_amount, window,
};
use super::spec::SearchSpec;
use crate::pdf::PageTextSource;

/// Maximum distance, in characters, between a parent occurrence's end and a
/// sub-key occurrence's start for the sub-key to count as that parent's.
const PARENT_PROXIMITY: i64 = 2000;

/// Characters inspected after a sub-key match for the dash guard.
const DASH_LOOKAHEAD: usize = 10;

/// Characters inspected after a sub-key match for word continuation.
const CONTINUATION_LOOKAHEAD: usize = 20;

/// Extra characters beyond the value window scanned for a date range.
const DATE_RANGE_EXTRA: usize = 100;

/// One keyword occurrence that yielded a monetary value.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundValue {
    pub amount: String,
    pub keyword: String,
    pub display_name: String,
    pub ukey: String,
    pub inline_context: String,
    pub page: u32,
    pub is_child: bool,
    pub parent_ukey: Option<String>,
    pub parent_keyword: Option<String>,
    pub installment: Option<String>,
    pub expiration: Option<String>,
    pub date_range: Option<String>,
    pub allow_multiple: bool,
    pub category: String,
}

/// Scan every page of the document for one contact's charges.
///
/// A page participates only when it carries both the contact's phone number
/// and (case-insensitively) their name. Pages whose text cannot be read are
/// skipped with a warning.
pub fn scan_contact(
    source: &dyn PageTextSource,
    contact: &Contact,
    specs: &[SearchSpec],
    dash_guard_ukeys: &[String],
) -> Vec<FoundValue> {
    let matchers = compile_matchers(specs);
    let name_lower = contact.name.to_lowercase();
    let mut found = Vec::new();

    for page in 1..=source.page_count() {
        let page_text = match source.page_text(page) {
            Ok(text) => text,
            Err(e) => {
                warn!(page, "skipping unreadable page: {e}");
                continue;
            }
        };

        if !page_text.contains(&contact.phone)
            || !page_text.to_lowercase().contains(&name_lower)
        {
            continue;
        }

        scan_page(
            &page_text,
            page,
            specs,
            &matchers,
            dash_guard_ukeys,
            &mut found,
        );
    }

    found
}

/// Compile one occurrence matcher per spec, case-insensitive. A pattern
/// override that fails to compile degrades to the literal term.
fn compile_matchers(specs: &[SearchSpec]) -> Vec<Regex> {
    specs
        .iter()
        .map(|spec| {
            if let Some(pattern) = &spec.pattern_override {
                match Regex::new(&format!("(?i){pattern}")) {
                    Ok(re) => return re,
                    Err(e) => {
                        warn!(
                            ukey = spec.ukey,
                            "invalid keyword pattern {pattern:?}: {e}, using literal term"
                        );
                    }
                }
            }
            literal_matcher(&spec.search_term)
        })
        .collect()
}

fn literal_matcher(term: &str) -> Regex {
    // Escaped literals always compile.
    Regex::new(&format!("(?i){}", regex::escape(term))).unwrap_or_else(|_| unreachable!())
}

fn scan_page(
    page_text: &str,
    page: u32,
    specs: &[SearchSpec],
    matchers: &[Regex],
    dash_guard_ukeys: &[String],
    found: &mut Vec<FoundValue>,
) {
    // Parent occurrence spans on this page, keyed by parent ukey.
    let mut parent_positions: HashMap<&str, Vec<(usize, usize)>> = HashMap::new();
    for (spec, matcher) in specs.iter().zip(matchers) {
        if spec.is_child {
            continue;
        }
        let spans: Vec<(usize, usize)> = matcher
            .find_iter(page_text)
            .map(|m| (m.start(), m.end()))
            .collect();
        if !spans.is_empty() {
            parent_positions.insert(spec.ukey.as_str(), spans);
        }
    }

    let mut sub_key_counts: HashMap<&str, usize> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (spec, matcher) in specs.iter().zip(matchers) {
        for keyword_match in matcher.find_iter(page_text) {
            let kw_start = keyword_match.start();
            let kw_end = keyword_match.end();

            if spec.is_child
                && spec.allow_multiple
                && !multiple_match_allowed(page_text, spec, kw_start, kw_end, dash_guard_ukeys)
            {
                continue;
            }

            // A sub-key only counts when it follows one of its parent's
            // occurrences on the same page, within PARENT_PROXIMITY.
            if spec.is_child {
                let Some(parent_ukey) = spec.parent_ukey.as_deref() else {
                    continue;
                };
                let Some(spans) = parent_positions.get(parent_ukey) else {
                    continue;
                };
                let near_parent = spans.iter().any(|&(p_start, p_end)| {
                    kw_start > p_start && (kw_start as i64 - p_end as i64) < PARENT_PROXIMITY
                });
                if !near_parent {
                    continue;
                }
            }

            if !spec.allow_multiple && seen.contains(spec.ukey.as_str()) {
                continue;
            }

            let value_window = window(page_text, kw_end, spec.search_window);
            let money_match = if spec.is_child {
                SIGNED_MONEY.find(value_window)
            } else {
                MONEY.find(value_window)
            };
            let Some(money_match) = money_match else {
                continue;
            };

            let amount = normalize_amount(money_match.as_str());
            let money_end = kw_end + money_match.end();

            let installment = spec
                .is_installment
                .then(|| INSTALLMENT.find(value_window))
                .flatten()
                .map(|m| m.as_str().trim().to_string());
            let expiration = spec
                .has_expiration
                .then(|| EXPIRATION.find(value_window))
                .flatten()
                .map(|m| m.as_str().trim().to_string());

            // Date ranges often sit past the value itself, so scan a
            // slightly wider window.
            let date_range = DATE_RANGE
                .find(window(
                    page_text,
                    kw_end,
                    spec.search_window + DATE_RANGE_EXTRA,
                ))
                .map(|m| m.as_str().trim().to_string());

            let ukey = if spec.is_child && spec.allow_multiple {
                let count = sub_key_counts.entry(spec.ukey.as_str()).or_insert(0);
                *count += 1;
                format!("{}_{count}", spec.ukey)
            } else {
                spec.ukey.clone()
            };

            found.push(FoundValue {
                amount,
                keyword: spec.search_term.clone(),
                display_name: spec.display_name.clone(),
                ukey,
                inline_context: collapse_whitespace(&page_text[kw_start..money_end]),
                page,
                is_child: spec.is_child,
                parent_ukey: spec.parent_ukey.clone(),
                parent_keyword: spec.parent_term.clone(),
                installment,
                expiration,
                date_range,
                allow_multiple: spec.allow_multiple,
                category: spec.category.clone(),
            });

            if !spec.allow_multiple {
                seen.insert(spec.ukey.as_str());
                break;
            }
        }
    }
}

/// Guards applied to allowMultiple sub-key occurrences, which otherwise
/// over-match on repetitive charge tables.
fn multiple_match_allowed(
    page_text: &str,
    spec: &SearchSpec,
    kw_start: usize,
    kw_end: usize,
    dash_guard_ukeys: &[String],
) -> bool {
    let matched = page_text[kw_start..kw_end].trim();
    if !matched.eq_ignore_ascii_case(spec.search_term.trim()) {
        return false;
    }

    // Word-boundary flanks.
    let bytes = page_text.as_bytes();
    if kw_start > 0 && bytes[kw_start - 1].is_ascii_alphanumeric() {
        return false;
    }
    if kw_end < bytes.len() && bytes[kw_end].is_ascii_alphanumeric() {
        return false;
    }

    // Truncated recurring-charge labels continue with a dash; reject those
    // for the configured ukeys.
    if dash_guard_ukeys.iter().any(|u| u == &spec.ukey) {
        let lookahead =
            window(page_text, kw_end, DASH_LOOKAHEAD).trim_start_matches([' ', '\n', '\r', '\t']);
        if lookahead.starts_with('-') {
            return false;
        }
    }

    // Reject matches that run straight into another word.
    let lookahead = window(page_text, kw_end, CONTINUATION_LOOKAHEAD).trim_start();
    if let Some(first) = lookahead.chars().next() {
        if first.is_alphabetic() {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::TextPages;
    use pretty_assertions::assert_eq;

    fn contact() -> Contact {
        Contact {
            phone: "555-123-4567".to_string(),
            name: "Jane Doe".to_string(),
        }
    }

    fn parent(term: &str, ukey: &str, window: usize) -> SearchSpec {
        SearchSpec {
            search_term: term.to_string(),
            display_name: term.to_string(),
            ukey: ukey.to_string(),
            search_window: window,
            is_child: false,
            parent_ukey: None,
            parent_term: None,
            pattern_override: None,
            is_installment: false,
            has_expiration: false,
            allow_multiple: false,
            category: String::new(),
        }
    }

    fn child(term: &str, ukey: &str, parent: &SearchSpec) -> SearchSpec {
        SearchSpec {
            search_term: term.to_string(),
            display_name: term.to_string(),
            ukey: ukey.to_string(),
            search_window: parent.search_window,
            is_child: true,
            parent_ukey: Some(parent.ukey.clone()),
            parent_term: Some(parent.search_term.clone()),
            pattern_override: None,
            is_installment: false,
            has_expiration: false,
            allow_multiple: false,
            category: String::new(),
        }
    }

    fn page(body: &str) -> TextPages {
        TextPages(vec![format!("555-123-4567 Jane Doe\n{body}")])
    }

    #[test]
    fn test_associates_money_with_keyword() {
        let source = page("Monthly Charges $75.00");
        let specs = vec![parent("Monthly Charges", "monthly", 50)];

        let found = scan_contact(&source, &contact(), &specs, &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, "$75.00");
        assert_eq!(found[0].ukey, "monthly");
        assert_eq!(found[0].page, 1);
        assert_eq!(found[0].inline_context, "Monthly Charges $75.00");
    }

    #[test]
    fn test_skips_pages_without_both_identifiers() {
        // Phone present, name absent.
        let source = TextPages(vec!["555-123-4567\nMonthly Charges $75.00".to_string()]);
        let specs = vec![parent("Monthly Charges", "monthly", 50)];
        assert!(scan_contact(&source, &contact(), &specs, &[]).is_empty());
    }

    #[test]
    fn test_money_outside_window_is_ignored() {
        let filler = "x".repeat(60);
        let source = page(&format!("Monthly Charges {filler} $75.00"));
        let specs = vec![parent("Monthly Charges", "monthly", 50)];
        assert!(scan_contact(&source, &contact(), &specs, &[]).is_empty());
    }

    #[test]
    fn test_child_requires_parent_on_page() {
        let p = parent("Monthly Charges", "monthly", 50);
        let c = child("Line Access", "line_access", &p);

        let with_parent = page("Monthly Charges $75.00\nLine Access $20.00");
        let found = scan_contact(&with_parent, &contact(), &[p.clone(), c.clone()], &[]);
        assert_eq!(found.len(), 2);
        assert!(found[1].is_child);
        assert_eq!(found[1].parent_ukey.as_deref(), Some("monthly"));

        // Without a parent occurrence on the page the sub-key is discarded.
        let orphaned = page("Line Access $20.00");
        let found = scan_contact(&orphaned, &contact(), &[p, c], &[]);
        assert!(found.is_empty());
    }

    #[test]
    fn test_child_before_parent_is_discarded() {
        let p = parent("Monthly Charges", "monthly", 50);
        let c = child("Line Access", "line_access", &p);
        let source = page("Line Access $20.00\nMonthly Charges $75.00");

        let found = scan_contact(&source, &contact(), &[p, c], &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ukey, "monthly");
    }

    #[test]
    fn test_child_negative_amount_normalized() {
        let p = parent("Monthly Charges", "monthly", 50);
        let c = child("Promo Credit", "promo", &p);
        let source = page("Monthly Charges $75.00\nPromo Credit -$12.00");

        let found = scan_contact(&source, &contact(), &[p.clone(), c.clone()], &[]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].amount, "-$12.00");

        // Amounts without a dollar sign are not monetary values here.
        let bare = page("Monthly Charges $75.00\nPromo Credit -12.00");
        let found = scan_contact(&bare, &contact(), &[p, c], &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ukey, "monthly");
    }

    #[test]
    fn test_duplicate_keyword_kept_once_per_page() {
        let source = page("Monthly Charges $75.00\nMonthly Charges $80.00");
        let specs = vec![parent("Monthly Charges", "monthly", 50)];

        let found = scan_contact(&source, &contact(), &specs, &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, "$75.00");
    }

    #[test]
    fn test_allow_multiple_suffixes_ukeys() {
        let p = parent("Monthly Charges", "monthly", 50);
        let mut c = child("Access Charge", "access", &p);
        c.allow_multiple = true;
        let source = page("Monthly Charges $75.00\nAccess Charge $10.00\nAccess Charge $11.00");

        let found = scan_contact(&source, &contact(), &[p, c], &[]);
        assert_eq!(found.len(), 3);
        assert_eq!(found[1].ukey, "access_1");
        assert_eq!(found[2].ukey, "access_2");
    }

    #[test]
    fn test_allow_multiple_rejects_word_continuation() {
        let p = parent("Monthly Charges", "monthly", 50);
        let mut c = child("Access Charge", "access", &p);
        c.allow_multiple = true;
        // "Access Charge waiver" continues into another word.
        let source = page("Monthly Charges $75.00\nAccess Charge waiver $10.00");

        let found = scan_contact(&source, &contact(), &[p, c], &[]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_dash_guard_rejects_configured_ukey() {
        let p = parent("Monthly Charges", "monthly", 50);
        let mut c = child("Access Charge", "accesscharge12m", &p);
        c.allow_multiple = true;
        let source = page("Monthly Charges $75.00\nAccess Charge - 12m $10.00");

        let guarded = scan_contact(
            &source,
            &contact(),
            &[p.clone(), c.clone()],
            &["accesscharge12m".to_string()],
        );
        assert_eq!(guarded.len(), 1);

        // Same text without the guard keeps the match.
        let unguarded = scan_contact(&source, &contact(), &[p, c], &[]);
        assert_eq!(unguarded.len(), 2);
    }

    #[test]
    fn test_installment_expiration_and_date_range() {
        let p = parent("Equipment Charges", "equipment", 120);
        let mut c = child("Phone Payment", "phone_payment", &p);
        c.is_installment = true;
        c.has_expiration = true;
        let source = page(
            "Equipment Charges $41.66\nPhone Payment 3 of 36 Expires on 12/31/25 $41.66 for 3/1 - 3/31",
        );

        let found = scan_contact(&source, &contact(), &[p, c], &[]);
        let entry = &found[1];
        assert_eq!(entry.installment.as_deref(), Some("3 of 36"));
        assert_eq!(entry.expiration.as_deref(), Some("Expires on 12/31/25"));
        assert_eq!(entry.date_range.as_deref(), Some("3/1 - 3/31"));
    }

    #[test]
    fn test_pattern_override_matches_variants() {
        let p = parent("Monthly Charges", "monthly", 50);
        let mut c = child("Access Charge", "access", &p);
        c.pattern_override = Some(r"Access\s+Charge".to_string());
        let source = page("Monthly Charges $75.00\nAccess  Charge $10.00");

        let found = scan_contact(&source, &contact(), &[p, c], &[]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].amount, "$10.00");
    }
}
