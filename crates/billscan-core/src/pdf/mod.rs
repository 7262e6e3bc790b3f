//! Document text layer access and page-range selection.

mod extractor;

pub use extractor::PdfTextSource;

use std::collections::BTreeSet;

use crate::error::PageError;

/// Result type for text-layer operations.
pub type Result<T> = std::result::Result<T, PageError>;

/// Per-page plain-text access for a loaded document.
///
/// Pages are 1-based. A failing page surfaces as a single error for that
/// page; callers skip it and continue.
pub trait PageTextSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Decoded plain text for a 1-based page index.
    fn page_text(&self, page: u32) -> Result<String>;
}

/// In-memory page source, one string per page. Used by tests and for
/// pre-decoded input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPages(pub Vec<String>);

impl PageTextSource for TextPages {
    fn page_count(&self) -> u32 {
        self.0.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let index = page.checked_sub(1).ok_or(PageError::InvalidPage(page))? as usize;
        self.0
            .get(index)
            .cloned()
            .ok_or(PageError::InvalidPage(page))
    }
}

/// Parse a page specification like `"1,3-5"` into an ascending,
/// duplicate-free page list clamped to `[1, total_pages]`.
///
/// An empty specification selects every page; malformed parts are ignored.
pub fn parse_page_range(spec: &str, total_pages: u32) -> Vec<u32> {
    if spec.trim().is_empty() {
        return (1..=total_pages).collect();
    }

    let mut pages = BTreeSet::new();
    let cleaned = spec.replace(' ', "");

    for part in cleaned.split(',') {
        if let Some((start, end)) = part.split_once('-') {
            let (Ok(start), Ok(end)) = (start.parse::<u32>(), end.parse::<u32>()) else {
                continue;
            };
            let start = start.max(1);
            let end = end.min(total_pages);
            if start <= end {
                pages.extend(start..=end);
            }
        } else if let Ok(page) = part.parse::<u32>() {
            if (1..=total_pages).contains(&page) {
                pages.insert(page);
            }
        }
    }

    pages.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_spec_selects_all_pages() {
        assert_eq!(parse_page_range("", 4), vec![1, 2, 3, 4]);
        assert_eq!(parse_page_range("  ", 2), vec![1, 2]);
    }

    #[test]
    fn test_single_pages_and_ranges() {
        assert_eq!(parse_page_range("1,3-5", 10), vec![1, 3, 4, 5]);
        assert_eq!(parse_page_range("3-5, 1", 10), vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_clamping_and_duplicates() {
        assert_eq!(parse_page_range("2-99", 4), vec![2, 3, 4]);
        assert_eq!(parse_page_range("1,1,2,1-2", 3), vec![1, 2]);
        assert_eq!(parse_page_range("7", 4), Vec::<u32>::new());
    }

    #[test]
    fn test_malformed_parts_are_ignored() {
        assert_eq!(parse_page_range("x,2,?-3", 4), vec![2]);
        assert_eq!(parse_page_range("nonsense", 4), Vec::<u32>::new());
    }

    #[test]
    fn test_text_pages_source() {
        let source = TextPages(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_text(2).unwrap(), "two");
        assert!(source.page_text(0).is_err());
        assert!(source.page_text(3).is_err());
    }
}
