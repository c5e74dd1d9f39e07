//! EPUB parsing utilities (container.xml, OPF manifest and spine)

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::IngestionError;
use crate::util::{decode_text, extract_xml_encoding};

const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Parsed OPF package data.
#[derive(Debug, Default)]
pub struct PackageDocument {
    /// `dc:title`, when present.
    pub title: Option<String>,
    /// Maps manifest id -> item
    pub manifest: HashMap<String, ManifestItem>,
    /// Manifest ids in reading order.
    pub spine: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub href: String,
    pub media_type: String,
}

impl ManifestItem {
    pub fn is_xhtml(&self) -> bool {
        self.media_type.eq_ignore_ascii_case("application/xhtml+xml")
    }
}

fn archive_error(context: &str, err: impl std::fmt::Display) -> IngestionError {
    IngestionError::ArchiveError(format!("{context}: {err}"))
}

/// Parse META-INF/container.xml to find the OPF path.
///
/// Prefers the rootfile declared as an OEBPS package and falls back to the
/// first rootfile with a path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String, IngestionError> {
    let content = decode_text(bytes, extract_xml_encoding(bytes));
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut fallback: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                let mut full_path = None;
                let mut is_package = false;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"full-path" => {
                            full_path = Some(String::from_utf8_lossy(&attr.value).into_owned())
                        }
                        b"media-type" => {
                            is_package = attr.value.as_ref() == PACKAGE_MEDIA_TYPE.as_bytes()
                        }
                        _ => {}
                    }
                }
                match full_path {
                    Some(path) if is_package => return Ok(path),
                    Some(path) if fallback.is_none() => fallback = Some(path),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(archive_error("container.xml", e)),
            _ => {}
        }
    }

    fallback.ok_or_else(|| {
        IngestionError::ArchiveError("no rootfile found in container.xml".to_string())
    })
}

/// Parse OPF package document.
pub fn parse_opf(content: &str) -> Result<PackageDocument, IngestionError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut package = PackageDocument::default();
    let mut in_metadata = false;
    let mut in_title = false;
    let mut title = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = true,
                b"title" if in_metadata && package.title.is_none() => {
                    in_title = true;
                    title.clear();
                }
                b"item" => insert_manifest_item(&mut package, &e),
                b"itemref" => push_spine_item(&mut package, &e),
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"item" => insert_manifest_item(&mut package, &e),
                b"itemref" => push_spine_item(&mut package, &e),
                _ => {}
            },
            Ok(Event::Text(e)) if in_title => {
                title.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) if in_title => {
                if let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref())) {
                    title.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = false,
                b"title" if in_title => {
                    in_title = false;
                    let trimmed = title.trim();
                    if !trimmed.is_empty() {
                        package.title = Some(trimmed.to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(archive_error("package document", e)),
            _ => {}
        }
    }

    Ok(package)
}

fn insert_manifest_item(package: &mut PackageDocument, e: &quick_xml::events::BytesStart<'_>) {
    let mut id = String::new();
    let mut href = String::new();
    let mut media_type = String::new();

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"id" => id = value,
            b"href" => href = value,
            b"media-type" => media_type = value,
            _ => {}
        }
    }

    if !id.is_empty() {
        package.manifest.insert(id, ManifestItem { href, media_type });
    }
}

fn push_spine_item(package: &mut PackageDocument, e: &quick_xml::events::BytesStart<'_>) {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"idref" {
            package
                .spine
                .push(String::from_utf8_lossy(&attr.value).into_owned());
        }
    }
}

/// Join a manifest href onto the package directory, percent-decoding it
/// and collapsing `.` / `..` segments.
///
/// `resolve_path("OEBPS/", "../Text/ch%201.xhtml")` -> `"Text/ch 1.xhtml"`
pub fn resolve_path(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let decoded = percent_encoding::percent_decode_str(href).decode_utf8_lossy();

    let joined = if decoded.starts_with('/') {
        decoded.trim_start_matches('/').to_string()
    } else {
        format!("{base_dir}{decoded}")
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
pub fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .position(|&b| b == b':')
        .map_or(name, |pos| &name[pos + 1..])
}

/// Resolve an XML or common HTML entity reference (without `&` and `;`).
pub fn resolve_entity(entity: &str) -> Option<String> {
    let named = match entity {
        "apos" => Some('\''),
        "quot" => Some('"'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "nbsp" => Some('\u{a0}'),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "hellip" => Some('\u{2026}'),
        "lsquo" => Some('\u{2018}'),
        "rsquo" => Some('\u{2019}'),
        "ldquo" => Some('\u{201c}'),
        "rdquo" => Some('\u{201d}'),
        "copy" => Some('\u{a9}'),
        _ => None,
    };
    if let Some(c) = named {
        return Some(c.to_string());
    }

    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}
