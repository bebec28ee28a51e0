//! Field-level escaping for CSV text
//!
//! Quoting follows the usual comma/double-quote rules. On top of that, tab,
//! newline and carriage return are written as two-character backslash
//! sequences so that every record stays on a single line.

use std::fmt::Display;

use crate::constants::{CSV_DELIMITER, CSV_QUOTE};

const CONTROL_ESCAPES: [(char, &str); 3] = [('\t', "\\t"), ('\n', "\\n"), ('\r', "\\r")];

/// Escape a string, number or boolean for embedding in a CSV line
pub fn escape_csv(value: impl Display) -> String {
    let mut text = value.to_string();
    for (literal, escaped) in CONTROL_ESCAPES {
        if text.contains(literal) {
            text = text.replace(literal, escaped);
        }
    }

    if text.contains(CSV_DELIMITER) || text.contains(CSV_QUOTE) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// Reverse of [`escape_csv`]: strips quoting and decodes `\t`, `\n`, `\r`
///
/// Any literal backslash sequence matching one of the escapes is decoded,
/// including text that never went through [`escape_csv`].
pub fn unescape_csv(value: &str) -> String {
    let mut text = unquote_field(value);
    for (literal, escaped) in CONTROL_ESCAPES {
        if text.contains(escaped) {
            text = text.replace(escaped, &literal.to_string());
        }
    }
    text
}

/// Trim a raw field and remove its surrounding quotes, collapsing `""` to `"`
///
/// Unlike [`unescape_csv`] this leaves backslash sequences untouched.
pub fn unquote_field(field: &str) -> String {
    let trimmed = field.trim();
    match strip_outer_quotes(trimmed) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => trimmed.to_string(),
    }
}

fn strip_outer_quotes(text: &str) -> Option<&str> {
    if !text.starts_with(CSV_QUOTE) || !text.ends_with(CSV_QUOTE) {
        return None;
    }
    // A lone quote both starts and ends the field
    if text.len() == 1 {
        return Some("");
    }
    Some(&text[1..text.len() - 1])
}

/// Split one line of CSV text on commas that are outside quoted spans
///
/// Quotes are kept in the returned fields; callers unquote them. Unbalanced
/// quotes are not an error, everything after the stray quote just stays in
/// the current field.
pub fn split_line(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        match c {
            CSV_QUOTE => {
                in_quotes = !in_quotes;
            }
            CSV_DELIMITER if !in_quotes => {
                fields.push(&line[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);

    fields
}
