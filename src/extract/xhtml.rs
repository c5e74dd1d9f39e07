//! Text extraction from a single XHTML content document.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::epub::{local_name, resolve_entity};

use super::normalize::collapse_whitespace;

/// Elements whose text forms its own paragraph.
const BLOCK_TAGS: &[&[u8]] = &[b"p", b"div", b"h1", b"h2", b"h3", b"h4", b"h5", b"h6"];

/// Subtrees that never contribute text.
const SKIP_TAGS: &[&[u8]] = &[b"script", b"style"];

/// Extract readable text from an XHTML chapter.
///
/// Block-level elements (`p`, `div`, headings) become paragraphs joined by
/// a blank line. A chapter without any block text falls back to every text
/// node joined by single spaces. `script` and `style` subtrees are dropped,
/// and only `<body>` is read when the document has one.
///
/// Nested blocks do not repeat text: each run of text belongs to the
/// innermost open block.
pub fn extract_chapter_text(content: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.expand_empty_elements = false;

    let mut collector = ChapterCollector::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => collector.open(local_name(e.name().as_ref())),
            Event::End(e) => collector.close(local_name(e.name().as_ref())),
            Event::Empty(e) => {
                if local_name(e.name().as_ref()) == b"br" {
                    collector.text(" ");
                }
            }
            Event::Text(e) => collector.text(&String::from_utf8_lossy(e.as_ref())),
            Event::CData(e) => collector.text(&String::from_utf8_lossy(e.as_ref())),
            Event::GeneralRef(e) => {
                if let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref())) {
                    collector.text(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(collector.finish())
}

#[derive(Default)]
struct ChapterCollector {
    skip_depth: usize,
    block_depth: usize,
    in_body: bool,
    seen_body: bool,

    /// Text of the innermost open block.
    current: String,
    paragraphs: Vec<String>,

    /// Fallback walk: text nodes inside `<body>` / anywhere.
    body_nodes: Vec<String>,
    all_nodes: Vec<String>,
}

impl ChapterCollector {
    fn open(&mut self, name: &[u8]) {
        if SKIP_TAGS.contains(&name) {
            self.skip_depth += 1;
        } else if name == b"body" {
            self.in_body = true;
            self.seen_body = true;
        } else if BLOCK_TAGS.contains(&name) && self.skip_depth == 0 {
            self.flush_block();
            self.block_depth += 1;
        }
    }

    fn close(&mut self, name: &[u8]) {
        if SKIP_TAGS.contains(&name) {
            self.skip_depth = self.skip_depth.saturating_sub(1);
        } else if name == b"body" {
            self.flush_block();
            self.in_body = false;
        } else if BLOCK_TAGS.contains(&name) && self.skip_depth == 0 {
            self.flush_block();
            self.block_depth = self.block_depth.saturating_sub(1);
        }
    }

    fn text(&mut self, raw: &str) {
        if self.skip_depth > 0 {
            return;
        }

        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            if self.in_body {
                self.body_nodes.push(trimmed.to_string());
            }
            self.all_nodes.push(trimmed.to_string());
        }

        if self.block_depth > 0 {
            self.current.push_str(raw);
        }
    }

    fn flush_block(&mut self) {
        let paragraph = collapse_whitespace(&self.current);
        if !paragraph.is_empty() {
            self.paragraphs.push(paragraph);
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.flush_block();

        if !self.paragraphs.is_empty() {
            return self.paragraphs.join("\n\n");
        }

        let nodes = if self.seen_body {
            self.body_nodes
        } else {
            self.all_nodes
        };
        nodes.join(" ")
    }
}
