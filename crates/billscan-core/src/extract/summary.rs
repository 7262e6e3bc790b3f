//! Document-level scans: bill summary, account-level late fees, and the
//! previous-balance ledger.

use tracing::warn;

use super::patterns::{
    ACCOUNT_TOKEN, DATE_ANY, DATE_LONG, DATE_NUMERIC, INVOICE_TOKEN, LEADING_PUNCT, MONEY,
    NO_PAYMENT, PAREN_MONEY, PERIOD_LONG, PERIOD_NUMERIC, PHONE, SIGNED_MONEY,
    collapse_whitespace, normalize_amount, window,
};
use crate::models::config::{ProviderSettings, SummaryKeyword};
use crate::models::record::{AccountCharges, BalanceEntry, LateFeeEntry, SummaryField, SummaryFieldKind};
use crate::pdf::PageTextSource;

/// Marker identifying the bill-summary page.
const BILL_SUMMARY_MARKER: &str = "Bill summary";

/// Marker identifying the previous-balance section.
const PREVIOUS_BALANCE_MARKER: &str = "Previous Balance";

/// Characters scanned after a summary sentence for its value.
const SUMMARY_WINDOW: usize = 200;

/// Characters scanned after the late-fee term for an amount.
const LATE_FEE_WINDOW: usize = 100;

/// Characters scanned after a previous-balance keyword for an amount.
const BALANCE_MONEY_WINDOW: usize = 300;

/// Wider window scanned for the nearest date and contact number.
const BALANCE_DETAIL_WINDOW: usize = 500;

/// Window scanned for zero-balance phrasing when no amount is present.
const NO_PAYMENT_WINDOW: usize = 200;

/// Billing-detail fields always scanned on the summary page, in addition to
/// the configured monetary sentences.
const BILLING_DETAILS: [(&str, &str, &str); 4] = [
    ("Account", "Account Number", "account"),
    ("Invoice", "Invoice Number", "invoice"),
    ("Billing period", "Billing Period", "billing_period"),
    ("Due date", "Due Date", "due_date"),
];

/// Monetary summary ukeys whose values may legitimately be negative or
/// parenthesized.
const SIGNED_EXEMPT_UKEYS: [&str; 2] = ["balance_forward", "total_charges"];

/// First page in `pages` whose text contains `marker`, case-insensitively.
fn find_marker_page(
    source: &dyn PageTextSource,
    pages: &[u32],
    marker: &str,
) -> Option<(u32, String)> {
    let marker_lower = marker.to_lowercase();
    for &page in pages {
        let text = match source.page_text(page) {
            Ok(text) => text,
            Err(e) => {
                warn!(page, "skipping unreadable page while locating {marker:?}: {e}");
                continue;
            }
        };
        if text.to_lowercase().contains(&marker_lower) {
            return Some((page, text));
        }
    }
    None
}

/// Scan the bill-summary page for the configured monetary sentences and the
/// built-in billing details. Returns nothing when no page carries the marker.
pub fn scan_bill_summary(
    source: &dyn PageTextSource,
    pages: &[u32],
    settings: &ProviderSettings,
) -> Vec<SummaryField> {
    let Some((page, page_text)) = find_marker_page(source, pages, BILL_SUMMARY_MARKER) else {
        return Vec::new();
    };

    let mut fields: Vec<SummaryField> = Vec::new();

    let detail_keywords: Vec<SummaryKeyword> = BILLING_DETAILS
        .iter()
        .map(|(keyword, name, ukey)| SummaryKeyword::with_metadata(keyword, name, ukey))
        .collect();

    for sentence in settings.inline_sentences.iter().chain(&detail_keywords) {
        let term = sentence.keyword();
        if term.is_empty() {
            continue;
        }
        let ukey = sentence.ukey();
        let is_detail = BILLING_DETAILS.iter().any(|(_, _, u)| *u == ukey);
        let matcher = match regex::Regex::new(&format!("(?i){}", regex::escape(term))) {
            Ok(re) => re,
            Err(_) => continue,
        };

        for term_match in matcher.find_iter(&page_text) {
            let term_end = term_match.end();
            let search_text = window(&page_text, term_end, SUMMARY_WINDOW);

            let value = if is_detail {
                billing_detail_value(&ukey, search_text)
            } else if SIGNED_EXEMPT_UKEYS.contains(&ukey.as_str()) {
                PAREN_MONEY
                    .find(search_text)
                    .map(|m| normalize_amount(m.as_str()))
            } else {
                MONEY.find(search_text).map(|m| m.as_str().trim().to_string())
            };
            let Some(value) = value else {
                continue;
            };

            let inline_context = if is_detail {
                format!("{term}: {value}")
            } else if let Some(m) = MONEY.find(search_text) {
                collapse_whitespace(&page_text[term_match.start()..term_end + m.end()])
            } else {
                format!("{term}: {value}")
            };

            let duplicate = fields
                .iter()
                .any(|f| f.amount == value && f.sentence == term);
            if duplicate {
                continue;
            }

            fields.push(SummaryField {
                sentence: term.to_string(),
                name: sentence.display_name(),
                ukey: ukey.clone(),
                amount: value,
                is_child: sentence.is_child(),
                inline_context,
                page,
                kind: if is_detail {
                    SummaryFieldKind::BillingDetail
                } else {
                    SummaryFieldKind::MoneyAmount
                },
            });
        }
    }

    fields
}

/// Pull a non-monetary billing-detail value out of the window following its
/// label: the first meaningful line, narrowed by a field-specific pattern.
fn billing_detail_value(ukey: &str, search_text: &str) -> Option<String> {
    let clean = LEADING_PUNCT.replace(search_text, "");

    for line in clean.split('\n') {
        let line = line.trim();
        if line.len() <= 1 {
            continue;
        }
        let value = match ukey {
            "account" => capture_or_truncate(&ACCOUNT_TOKEN, line, 30),
            "invoice" => capture_or_truncate(&INVOICE_TOKEN, line, 30),
            "billing_period" => PERIOD_LONG
                .captures(line)
                .or_else(|| PERIOD_NUMERIC.captures(line))
                .map(|c| c[1].trim().to_string())
                .unwrap_or_else(|| truncate(line, 50)),
            "due_date" => DATE_LONG
                .captures(line)
                .or_else(|| DATE_NUMERIC.captures(line))
                .map(|c| c[1].trim().to_string())
                .unwrap_or_else(|| truncate(line, 30)),
            _ => truncate(line, 50),
        };
        return Some(value);
    }

    // Nothing line-shaped: fall back to the leading word run.
    let fallback = truncate(clean.trim(), 50);
    (!fallback.is_empty()).then_some(fallback)
}

fn capture_or_truncate(pattern: &regex::Regex, line: &str, limit: usize) -> String {
    pattern
        .captures(line)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| truncate(line, limit))
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect::<String>().trim().to_string()
}

/// Scan for the account-level charges section and its late fees.
pub fn scan_account_charges(
    source: &dyn PageTextSource,
    pages: &[u32],
    settings: &ProviderSettings,
) -> AccountCharges {
    let keywords = &settings.account_level_keywords;
    let Some((page, page_text)) = find_marker_page(source, pages, &keywords.search_term) else {
        return AccountCharges::SectionMissing;
    };

    let matcher =
        match regex::Regex::new(&format!("(?i){}", regex::escape(&keywords.late_fee_sentence))) {
            Ok(re) => re,
            Err(_) => return AccountCharges::NoLateFees,
        };

    let mut entries: Vec<LateFeeEntry> = Vec::new();
    for fee_match in matcher.find_iter(&page_text) {
        let search_text = window(&page_text, fee_match.end(), LATE_FEE_WINDOW);
        let Some(money_match) = MONEY.find(search_text) else {
            continue;
        };

        let amount = money_match.as_str().trim().to_string();
        let money_end = fee_match.end() + money_match.end();
        let duplicate = entries
            .iter()
            .any(|e| e.amount == amount && e.sentence == keywords.late_fee_sentence);
        if duplicate {
            continue;
        }

        entries.push(LateFeeEntry {
            amount,
            sentence: keywords.late_fee_sentence.clone(),
            inline_context: collapse_whitespace(&page_text[fee_match.start()..money_end]),
            page,
        });
    }

    if entries.is_empty() {
        AccountCharges::NoLateFees
    } else {
        AccountCharges::Found(entries)
    }
}

/// Scan the previous-balance section for each configured keyword, pairing
/// every amount with the nearest following date and contact number.
pub fn scan_previous_balance(
    source: &dyn PageTextSource,
    pages: &[u32],
    settings: &ProviderSettings,
) -> Vec<BalanceEntry> {
    let Some((page, page_text)) = find_marker_page(source, pages, PREVIOUS_BALANCE_MARKER) else {
        return Vec::new();
    };

    let mut entries = Vec::new();

    for keyword in &settings.previous_balance_keywords {
        let term = keyword.keyword();
        if term.is_empty() {
            continue;
        }
        let matcher = match regex::Regex::new(&format!("(?i){}", regex::escape(term))) {
            Ok(re) => re,
            Err(_) => continue,
        };

        for term_match in matcher.find_iter(&page_text) {
            let term_end = term_match.end();
            let money_window = window(&page_text, term_end, BALANCE_MONEY_WINDOW);

            let Some(money_match) = SIGNED_MONEY.find(money_window) else {
                // A zero balance is sometimes spelled out instead of priced.
                if keyword.ukey() == "previous_balance" {
                    let no_payment_window = window(&page_text, term_end, NO_PAYMENT_WINDOW);
                    if let Some(m) = NO_PAYMENT.find(no_payment_window) {
                        entries.push(BalanceEntry {
                            amount: "$0.00".to_string(),
                            date: String::new(),
                            contact: String::new(),
                            sentence: term.to_string(),
                            name: keyword.display_name(),
                            ukey: keyword.ukey(),
                            header: keyword.header(),
                            is_child: keyword.is_child(),
                            include_contact: keyword.include_contact(),
                            inline_context: format!("{term}: {}", m.as_str().trim()),
                            page,
                        });
                    }
                }
                continue;
            };

            let money_end = term_end + money_match.end();
            let detail_window = window(&page_text, term_end, BALANCE_DETAIL_WINDOW);

            // The first match after the keyword is the nearest one.
            let date_match = DATE_ANY.find(detail_window);
            let phone_match = PHONE.find(detail_window);

            let mut context_end = money_end;
            if let Some(m) = &date_match {
                context_end = context_end.max(term_end + m.end());
            }
            if let Some(m) = &phone_match {
                context_end = context_end.max(term_end + m.end());
            }

            entries.push(BalanceEntry {
                amount: money_match.as_str().trim().to_string(),
                date: date_match.map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
                contact: phone_match.map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
                sentence: term.to_string(),
                name: keyword.display_name(),
                ukey: keyword.ukey(),
                header: keyword.header(),
                is_child: keyword.is_child(),
                include_contact: keyword.include_contact(),
                inline_context: collapse_whitespace(&page_text[term_match.start()..context_end]),
                page,
            });
        }
    }

    entries
}
