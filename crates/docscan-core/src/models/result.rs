//! Recognized pages and the joined extraction result.

use serde::{Deserialize, Serialize};

use crate::format::SupportedFormat;

/// Separator appended after every page of a multi-page document.
pub const PAGE_SEPARATOR: &str = "\n---\n";

/// Text recognized on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedPage {
    /// Page index (0-based, in source order).
    pub index: usize,
    /// Recognized text, empty for a blank page.
    pub text: String,
}

/// All pages recognized from one request, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Format the input was resolved to.
    pub format: SupportedFormat,
    /// Pages in source order.
    pub pages: Vec<RecognizedPage>,
}

impl ExtractionResult {
    /// Result for a plain raster image.
    pub fn image(text: String) -> Self {
        Self {
            format: SupportedFormat::RasterImage,
            pages: vec![RecognizedPage { index: 0, text }],
        }
    }

    /// Result for a PDF; `pages` must already be in page order.
    pub fn pdf(pages: Vec<RecognizedPage>) -> Self {
        Self {
            format: SupportedFormat::Pdf,
            pages,
        }
    }

    /// Join the pages into a single document.
    ///
    /// Images return the transcription unchanged. PDFs get
    /// [`PAGE_SEPARATOR`] after every page, including the last; a PDF with
    /// no pages yields an empty string.
    pub fn text(&self) -> String {
        match self.format {
            SupportedFormat::Pdf => {
                let mut joined = String::new();
                for page in &self.pages {
                    joined.push_str(&page.text);
                    joined.push_str(PAGE_SEPARATOR);
                }
                joined
            }
            _ => self
                .pages
                .first()
                .map(|p| p.text.clone())
                .unwrap_or_default(),
        }
    }

    /// Number of recognized pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(index: usize, text: &str) -> RecognizedPage {
        RecognizedPage {
            index,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_image_text_has_no_separator() {
        let result = ExtractionResult::image("line one\nline two".to_string());
        assert_eq!(result.text(), "line one\nline two");
    }

    #[test]
    fn test_pdf_separator_after_every_page() {
        let result = ExtractionResult::pdf(vec![page(0, "a"), page(1, ""), page(2, "c")]);
        assert_eq!(result.text(), "a\n---\n\n---\nc\n---\n");
    }

    #[test]
    fn test_empty_pdf_is_empty_string() {
        let result = ExtractionResult::pdf(vec![]);
        assert_eq!(result.text(), "");
        assert_eq!(result.page_count(), 0);
    }
}
