//! Small helpers shared by the extractors and the library store.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Current wall-clock time.
///
/// chrono reads `Date.now()` on WASM through its `wasmbind` feature, so
/// this works in every context.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh document id, e.g. `book_1718000000000_0`.
///
/// The millisecond timestamp keeps ids readable and roughly ordered; the
/// sequence suffix keeps two imports in the same millisecond apart.
pub fn new_document_id() -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("book_{}_{}", now().timestamp_millis(), seq)
}

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (common in old ebooks)
///
/// Used for markup inside archives, where a wrong guess costs a few
/// characters rather than the whole document.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Strict UTF-8 decode (a leading BOM is dropped). `None` if any byte
/// sequence is malformed.
pub fn decode_utf8_strict(bytes: &[u8]) -> Option<Cow<'_, str>> {
    encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(strip_bom(bytes))
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Extract the encoding name from an XML declaration, if any.
///
/// Looks for `encoding="..."` inside `<?xml ...?>` within the first 100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let quote = *after_enc.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// File name without its final extension: `"My Book.v2.epub"` -> `"My Book.v2"`.
pub fn title_from_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rfind('.') {
        Some(dot) if dot > 0 => base[..dot].to_string(),
        _ => base.to_string(),
    }
}

pub const UNTITLED: &str = "Untitled";
const MAX_TITLE_CHARS: usize = 50;

/// First non-blank line when it is short enough to be a heading.
pub fn title_from_content(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| line.chars().count() <= MAX_TITLE_CHARS)
        .map_or_else(|| UNTITLED.to_string(), str::to_string)
}
