//! Plain-text extraction.

use crate::error::IngestionError;
use crate::util::decode_utf8_strict;

use super::normalize::normalize_text;
use super::{Extraction, Extractor};

/// UTF-8 text files. Anything that is not valid UTF-8 is rejected rather
/// than guessed at.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestionError> {
        let decoded = decode_utf8_strict(bytes).ok_or(IngestionError::EncodingError)?;
        Extraction::from_text(normalize_text(&decoded), Vec::new())
    }
}
