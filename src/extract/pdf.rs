//! Page-image document (PDF) extraction.

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::IngestionError;

use super::normalize::{collapse_whitespace, normalize_text};
use super::{Extraction, Extractor};

/// Extracts the text layer of each page in order. Scanned pages without a
/// text layer simply contribute nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestionError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| IngestionError::ArchiveError(format!("unreadable PDF: {e}")))?;

        let pages = doc.get_pages();
        debug!(pages = pages.len(), "loaded PDF");

        let mut page_texts = Vec::with_capacity(pages.len());
        let mut warnings = Vec::new();

        for page_number in pages.keys().copied() {
            match doc.extract_text(&[page_number]) {
                // Positioned text runs come back separated by newlines and
                // spaces; a page reads as one paragraph of single-spaced runs.
                Ok(raw) => {
                    let text = collapse_whitespace(&raw);
                    if !text.is_empty() {
                        page_texts.push(text);
                    }
                }
                Err(e) => {
                    warn!(page = page_number, error = %e, "skipping page without extractable text");
                    warnings.push(format!("could not extract text from page {page_number}: {e}"));
                }
            }
        }

        Extraction::from_text(normalize_text(&page_texts.join("\n\n")), warnings)
    }
}
