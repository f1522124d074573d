//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// PDF text extractor.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    max_pages: usize,
    min_text_length: usize,
}

/// Text read from a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    pub pdf_type: PdfType,
    /// Text of all read pages, separated by blank lines.
    pub text: String,
    pub page_count: u32,
}

impl PdfExtractor {
    /// Create a new PDF extractor with default limits.
    pub fn new() -> Self {
        Self::with_config(&PdfConfig::default())
    }

    pub fn with_config(config: &PdfConfig) -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            max_pages: config.max_pages,
            min_text_length: config.min_text_length,
        }
    }

    /// Load a PDF and read its text layer in one go.
    pub fn extract_all(&mut self, data: &[u8]) -> Result<PdfContent> {
        self.load(data)?;
        let text = self.extract_text()?;
        let pdf_type = self.classify(&text);

        debug!(
            "PDF analysis: {} pages, {} chars text -> {:?}",
            self.page_count(),
            text.len(),
            pdf_type
        );

        Ok(PdfContent {
            pdf_type,
            text,
            page_count: self.page_count(),
        })
    }

    fn classify(&self, text: &str) -> PdfType {
        if text.trim().len() >= self.min_text_length {
            PdfType::Text
        } else {
            PdfType::Empty
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfType {
        let text = self.extract_text().unwrap_or_default();
        self.classify(&text)
    }

    fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        let pages = pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let limit = if self.max_pages == 0 { pages.len() } else { self.max_pages };
        if pages.len() > limit {
            debug!("Reading {} of {} pages", limit, pages.len());
        }

        let text = pages
            .iter()
            .take(limit)
            .map(|p| p.trim_end())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert_eq!(extractor.analyze(), PdfType::Empty);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_is_pdf() {
        assert!(super::super::is_pdf(b"%PDF-1.7\n..."));
        assert!(!super::super::is_pdf(b"Booking reference ABC123"));
    }

    #[test]
    fn test_classify_by_length() {
        let extractor = PdfExtractor::with_config(&PdfConfig {
            max_pages: 1,
            min_text_length: 10,
        });
        assert_eq!(extractor.classify("   short  "), PdfType::Empty);
        assert_eq!(extractor.classify("Departure Berlin Hbf 10:05"), PdfType::Text);
    }
}
