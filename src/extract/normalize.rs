//! Post-extraction text cleanup shared by every format.

/// Normalize extracted text:
/// - `\r\n` and lone `\r` become `\n`
/// - runs of three or more newlines collapse to exactly two (one blank line)
/// - leading and trailing whitespace is trimmed
pub fn normalize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut newlines = 0usize;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let c = match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                '\n'
            }
            other => other,
        };

        if c == '\n' {
            newlines += 1;
            continue;
        }

        flush_newlines(&mut out, newlines);
        newlines = 0;
        out.push(c);
    }
    flush_newlines(&mut out, newlines);

    let trimmed = out.trim();
    if trimmed.len() == out.len() {
        out
    } else {
        trimmed.to_string()
    }
}

fn flush_newlines(out: &mut String, count: usize) {
    for _ in 0..count.min(2) {
        out.push('\n');
    }
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
