//! Field-block parsing for `.tid` files and `.meta` sidecars.
//!
//! Both formats start with `name: value` lines. A `.tid` file continues
//! with a blank line and the record body.

use super::Record;

/// Parse `name: value` header lines into a record.
///
/// Lines without a colon and field names containing whitespace are skipped.
pub fn parse_fields(text: &str) -> Record {
    let mut record = Record::default();
    for line in text.lines() {
        if let Some((name, value)) = split_field(line) {
            record.set(name, value);
        }
    }
    record
}

/// Parse a `.tid` file: header fields, a blank line, then the body as `text`.
pub fn parse_tid(text: &str) -> Record {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let normalized = text.replace("\r\n", "\n");

    let (header, body) = match normalized.split_once("\n\n") {
        Some((header, body)) => (header, Some(body)),
        None => (normalized.as_str(), None),
    };

    let mut record = parse_fields(header);
    if let Some(body) = body {
        record.set("text", body.trim_end_matches('\n'));
    }
    record
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }
    Some((name, value.trim()))
}
