//! Archive-based e-book (EPUB) extraction.

use std::io::{Cursor, Read};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::epub::{parse_container_xml, parse_opf, resolve_path};
use crate::error::IngestionError;
use crate::util::{decode_text, extract_xml_encoding};

use super::normalize::normalize_text;
use super::xhtml::extract_chapter_text;
use super::{Extraction, Extractor};

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Reads the spine of an EPUB in order and concatenates chapter text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubExtractor;

impl Extractor for EpubExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Extraction, IngestionError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| IngestionError::ArchiveError(format!("not a zip archive: {e}")))?;

        // 1. Locate the package document through container.xml
        let container = read_entry(&mut archive, CONTAINER_PATH).map_err(|e| {
            IngestionError::ArchiveError(format!("{CONTAINER_PATH} is missing: {e}"))
        })?;
        let opf_path = parse_container_xml(&container)?;
        let opf_base = match opf_path.rfind('/') {
            Some(slash) => opf_path[..=slash].to_string(),
            None => String::new(),
        };

        // 2. Parse manifest and spine
        let opf_bytes = read_entry(&mut archive, &opf_path).map_err(|e| {
            IngestionError::ArchiveError(format!("package document {opf_path} is missing: {e}"))
        })?;
        let opf_str = decode_text(&opf_bytes, extract_xml_encoding(&opf_bytes));
        let package = parse_opf(&opf_str)?;
        debug!(
            opf = %opf_path,
            title = ?package.title,
            manifest = package.manifest.len(),
            spine = package.spine.len(),
            "parsed package document"
        );

        // 3. Walk the spine
        let mut chapters = Vec::new();
        let mut warnings = Vec::new();

        for idref in &package.spine {
            let Some(item) = package.manifest.get(idref) else {
                warnings.push(format!("spine item {idref} is not in the manifest"));
                continue;
            };
            if !item.is_xhtml() {
                continue;
            }

            let path = resolve_path(&opf_base, &item.href);
            let chapter_bytes = match read_entry(&mut archive, &path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(chapter = %path, error = %e, "skipping unreadable chapter");
                    warnings.push(format!("could not read chapter {path}: {e}"));
                    continue;
                }
            };

            let chapter_str = decode_text(&chapter_bytes, extract_xml_encoding(&chapter_bytes));
            match extract_chapter_text(&chapter_str) {
                Ok(text) if !text.trim().is_empty() => chapters.push(text),
                Ok(_) => debug!(chapter = %path, "chapter has no text"),
                Err(e) => {
                    warn!(chapter = %path, error = %e, "skipping malformed chapter");
                    warnings.push(format!("could not parse chapter {path}: {e}"));
                }
            }
        }

        Extraction::from_text(normalize_text(&chapters.join("\n\n")), warnings)
    }
}

/// Read a ZIP entry by path, retrying with the percent-decoded path for
/// archives that store names unescaped.
fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    path: &str,
) -> zip::result::ZipResult<Vec<u8>> {
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(e) => return Err(e),
    }

    let decoded = percent_encoding::percent_decode_str(path).decode_utf8_lossy();
    let mut file = archive.by_name(&decoded)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}
