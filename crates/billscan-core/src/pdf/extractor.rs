//! PDF text layer access using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, warn};

use super::{PageTextSource, Result};
use crate::error::PageError;

/// Page source backed by a PDF's text layer.
///
/// The text layer is decoded once at load time. When decoding fails the
/// document still loads; every page read then reports the failure, which
/// scanners treat as a skippable page rather than a fatal error.
#[derive(Debug)]
pub struct PdfTextSource {
    page_count: u32,
    pages: std::result::Result<Vec<String>, String>,
}

impl PdfTextSource {
    /// Load a PDF from memory.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut doc = Document::load_mem(data).map_err(|e| PageError::Parse(e.to_string()))?;

        // Some bills ship encrypted with an empty password.
        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PageError::Encrypted);
            }
            debug!("decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PageError::Parse(format!("failed to save decrypted PDF: {e}")))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len() as u32;
        if page_count == 0 {
            return Err(PageError::NoPages);
        }

        let pages = match pdf_extract::extract_text_from_mem(&raw_data) {
            Ok(text) => Ok(split_pages(&text, page_count)),
            Err(e) => {
                warn!("text layer extraction failed: {e}");
                Err(e.to_string())
            }
        };

        debug!(page_count, "loaded PDF");
        Ok(Self { page_count, pages })
    }

    /// Load a PDF from disk.
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PageError::Parse(e.to_string()))?;
        Self::load(&data)
    }
}

impl PageTextSource for PdfTextSource {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_text(&self, page: u32) -> Result<String> {
        if page == 0 || page > self.page_count {
            return Err(PageError::InvalidPage(page));
        }
        match &self.pages {
            Ok(pages) => Ok(pages[(page - 1) as usize].clone()),
            Err(reason) => Err(PageError::TextExtraction(reason.clone())),
        }
    }
}

/// Split the full extracted text into per-page chunks. Form feeds mark page
/// ends when the extractor emits them; otherwise fall back to even line
/// windows.
fn split_pages(full_text: &str, page_count: u32) -> Vec<String> {
    let count = page_count as usize;

    let by_feed: Vec<&str> = full_text.split('\u{c}').collect();
    if by_feed.len() == count || by_feed.len() == count + 1 {
        return by_feed.into_iter().take(count).map(str::to_string).collect();
    }

    let lines: Vec<&str> = full_text.lines().collect();
    let per_page = (lines.len() / count).max(1);
    (0..count)
        .map(|i| {
            let start = (i * per_page).min(lines.len());
            let end = if i + 1 == count {
                lines.len()
            } else {
                ((i + 1) * per_page).min(lines.len())
            };
            lines[start..end].join("\n")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_garbage_input_is_a_parse_error() {
        let err = PdfTextSource::load(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PageError::Parse(_)));
    }

    #[test]
    fn test_split_pages_by_form_feed() {
        let text = "page one\u{c}page two\u{c}";
        assert_eq!(split_pages(text, 2), vec!["page one", "page two"]);
    }

    #[test]
    fn test_split_pages_by_line_windows() {
        let text = "a\nb\nc\nd\ne";
        assert_eq!(split_pages(text, 2), vec!["a\nb", "c\nd\ne"]);
    }

    #[test]
    fn test_page_bounds() {
        let source = PdfTextSource {
            page_count: 1,
            pages: Ok(vec!["text".to_string()]),
        };
        assert_eq!(source.page_text(1).unwrap(), "text");
        assert!(matches!(
            source.page_text(2),
            Err(PageError::InvalidPage(2))
        ));
    }

    #[test]
    fn test_failed_text_layer_reports_per_page() {
        let source = PdfTextSource {
            page_count: 2,
            pages: Err("no text layer".to_string()),
        };
        assert!(matches!(
            source.page_text(1),
            Err(PageError::TextExtraction(_))
        ));
    }
}
