//! Format extraction: turn an input file into normalized flat text.
//!
//! A [`Format`] is detected once from the file extension and selects the
//! [`Extractor`] that handles it. All extractors share the same contract
//! and the same post-normalization (see [`normalize_text`]).
//!
//! ```
//! use touchfish::extract::{extract, Format};
//!
//! let extraction = extract(b"Hello world.\r\n\r\n\r\nThis is page two.", "txt").unwrap();
//! assert_eq!(extraction.text, "Hello world.\n\nThis is page two.");
//! assert_eq!(Format::from_file_name("Novel.EPUB"), Some(Format::ArchiveEbook));
//! ```

mod epub;
mod normalize;
mod pdf;
mod text;
mod xhtml;

pub use epub::EpubExtractor;
pub use normalize::{collapse_whitespace, normalize_text};
pub use pdf::PdfExtractor;
pub use text::PlainTextExtractor;
pub use xhtml::extract_chapter_text;

use tracing::{info, warn};

use crate::config::AdmissionConfig;
use crate::error::IngestionError;
use crate::util::title_from_file_name;

/// Supported input container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `.txt`
    PlainText,
    /// `.epub`
    ArchiveEbook,
    /// `.pdf`
    PageImageDocument,
}

impl Format {
    /// Detect from an extension such as `"epub"` or `".EPUB"`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        if ext.eq_ignore_ascii_case("txt") {
            Some(Format::PlainText)
        } else if ext.eq_ignore_ascii_case("epub") {
            Some(Format::ArchiveEbook)
        } else if ext.eq_ignore_ascii_case("pdf") {
            Some(Format::PageImageDocument)
        } else {
            None
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::PlainText => "txt",
            Format::ArchiveEbook => "epub",
            Format::PageImageDocument => "pdf",
        }
    }

    /// The extractor implementing this format.
    pub fn extractor(self) -> &'static dyn Extractor {
        match self {
            Format::PlainText => &PlainTextExtractor,
            Format::ArchiveEbook => &EpubExtractor,
            Format::PageImageDocument => &PdfExtractor,
        }
    }
}

/// Common contract of every format backend.
pub trait Extractor: Send + Sync {
    /// Convert the raw file into normalized text.
    ///
    /// Damage confined to one chapter or page is reported in
    /// [`Extraction::warnings`]; only a document with no text at all fails.
    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestionError>;
}

/// Successful extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    /// Chapters or pages that were skipped, with the reason.
    pub warnings: Vec<String>,
}

impl Extraction {
    /// Wrap already-normalized text, failing on an empty result.
    pub(crate) fn from_text(text: String, warnings: Vec<String>) -> Result<Self, IngestionError> {
        if text.is_empty() {
            return Err(IngestionError::EmptyContent);
        }
        Ok(Self { text, warnings })
    }
}

/// Extract text from `bytes` according to the declared extension.
pub fn extract(bytes: &[u8], extension: &str) -> Result<Extraction, IngestionError> {
    let format = Format::from_extension(extension)
        .ok_or_else(|| IngestionError::UnsupportedFormat(extension.to_string()))?;
    format.extractor().extract(bytes)
}

/// Boundary check performed before extraction: extension allow-list and
/// size ceiling.
pub fn admit(
    file_name: &str,
    size: u64,
    config: &AdmissionConfig,
) -> Result<Format, IngestionError> {
    let allowed = file_name.rsplit_once('.').is_some_and(|(_, ext)| {
        config
            .allowed_extensions
            .iter()
            .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
    });
    let format = Format::from_file_name(file_name)
        .filter(|_| allowed)
        .ok_or_else(|| IngestionError::UnsupportedFormat(file_name.to_string()))?;

    if size > config.max_input_bytes {
        return Err(IngestionError::OversizeInput {
            size,
            limit: config.max_input_bytes,
        });
    }
    Ok(format)
}

/// A file ready to become a library record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    pub title: String,
    pub format: Format,
    pub extraction: Extraction,
}

/// Admission plus extraction for a named file; the title is the file name
/// without its extension.
pub fn ingest(
    file_name: &str,
    bytes: &[u8],
    config: &AdmissionConfig,
) -> Result<IngestedFile, IngestionError> {
    let format = admit(file_name, bytes.len() as u64, config)?;
    let extraction = format.extractor().extract(bytes).inspect_err(|e| {
        warn!(file = file_name, kind = e.kind(), error = %e, "extraction failed");
    })?;

    info!(
        file = file_name,
        ?format,
        chars = extraction.text.chars().count(),
        warnings = extraction.warnings.len(),
        "extracted document"
    );

    Ok(IngestedFile {
        title: title_from_file_name(file_name),
        format,
        extraction,
    })
}
