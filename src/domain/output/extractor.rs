//! Extraction of embedded JSON from free-form tool output.
//!
//! Assistant-style tools return prose that often carries a JSON payload
//! inside a fenced code block or inline. Extraction tries progressively
//! looser strategies and gives up gracefully.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("fenced block pattern"));

/// Attempts to extract a JSON document from `text`.
///
/// Strategies, in order: parse the whole string; parse each fenced code
/// block; parse the first balanced `{…}` and then `[…]` substring.
/// Returns `None` when nothing parses.
pub fn extract_json_from_text(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }

    for caps in FENCED_BLOCK.captures_iter(text) {
        if let Ok(value) = serde_json::from_str(caps[1].trim()) {
            return Some(value);
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(candidate) = first_balanced(text, open, close) {
            if let Ok(value) = serde_json::from_str(candidate) {
                return Some(value);
            }
        }
    }

    None
}

/// Finds the first balanced `open…close` substring, respecting JSON string
/// literals and escapes.
fn first_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
