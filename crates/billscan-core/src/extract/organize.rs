//! Grouping of found values into per-contact parent/child records.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

use super::contacts::Contact;
use super::engine::FoundValue;
use super::patterns::MONTH_DAY;
use crate::models::record::{ChildEntry, ContactRecord, ParentEntry};

/// Assemble one contact's found values into a record with children nested
/// under their parents.
///
/// Parents keep document order; a second parent with an already-seen ukey is
/// skipped. Children whose parent yielded no entry are dropped.
pub fn organize_contact(contact: &Contact, found: &[FoundValue]) -> ContactRecord {
    let mut parents: Vec<ParentEntry> = Vec::new();
    let mut parent_index: HashMap<String, usize> = HashMap::new();

    for value in found.iter().filter(|v| !v.is_child) {
        if parent_index.contains_key(&value.ukey) {
            debug!(
                ukey = value.ukey,
                page = value.page,
                "duplicate parent entry, keeping the first"
            );
            continue;
        }
        parent_index.insert(value.ukey.clone(), parents.len());
        parents.push(ParentEntry {
            amount: value.amount.clone(),
            keyword: value.keyword.clone(),
            name: value.display_name.clone(),
            ukey: value.ukey.clone(),
            inline_context: value.inline_context.clone(),
            page: value.page,
            sub_keys: Vec::new(),
        });
    }

    for value in found.iter().filter(|v| v.is_child) {
        let parent = value
            .parent_ukey
            .as_ref()
            .and_then(|ukey| parent_index.get(ukey));
        let Some(&index) = parent else {
            debug!(
                ukey = value.ukey,
                page = value.page,
                "sub-key without a matching parent entry, dropping"
            );
            continue;
        };
        parents[index].sub_keys.push(ChildEntry {
            amount: value.amount.clone(),
            keyword: value.keyword.clone(),
            name: value.display_name.clone(),
            ukey: value.ukey.clone(),
            inline_context: value.inline_context.clone(),
            parent_keyword: value.parent_keyword.clone().unwrap_or_default(),
            page: value.page,
            installment: value.installment.clone(),
            expiration: value.expiration.clone(),
            date_range: value.date_range.clone(),
            allow_multiple: value.allow_multiple,
            category: value.category.clone(),
        });
    }

    for parent in &mut parents {
        parent.sub_keys.sort_by(compare_children);
    }

    ContactRecord {
        phone: contact.phone.clone(),
        name: contact.name.clone(),
        money_amounts: parents,
    }
}

/// Children order: category buckets alphabetically with uncategorized last,
/// then by service-period start date, then by ukey.
fn compare_children(a: &ChildEntry, b: &ChildEntry) -> Ordering {
    category_rank(a)
        .cmp(&category_rank(b))
        .then_with(|| date_key(a).cmp(&date_key(b)))
        .then_with(|| a.ukey.cmp(&b.ukey))
}

fn category_rank(child: &ChildEntry) -> (bool, &str) {
    (child.category.is_empty(), child.category.as_str())
}

/// Start of the child's service period, resolved against the current year.
/// Entries with no parseable date sort before dated ones.
fn date_key(child: &ChildEntry) -> NaiveDate {
    let Some(range) = &child.date_range else {
        return NaiveDate::MIN;
    };
    MONTH_DAY
        .find(range)
        .and_then(|m| {
            let (month, day) = m.as_str().split_once('/')?;
            NaiveDate::from_ymd_opt(
                Local::now().year(),
                month.parse().ok()?,
                day.parse().ok()?,
            )
        })
        .unwrap_or(NaiveDate::MIN)
}
