//! Dotted-path traversal over JSON documents.
//!
//! Paths are `.`-separated segments; bracket indexing `items[0]` is
//! rewritten to `items.0` before traversal. Resolution never fails: a path
//! that cannot be followed yields `None` (*absent*), which is distinct
//! from resolving to an explicit `null`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

static BRACKET_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(-?\d+)\]").expect("bracket index pattern"));

/// Resolves `path` against `root`, returning the value or *absent*.
///
/// Traversal rules per segment:
/// - numeric segment against a sequence: index, with negative indexing
///   (`-1` = last); out of range is absent;
/// - numeric segment against a mapping: a verbatim string key (`"0"`)
///   wins; otherwise index `0` skips the segment and retries against the
///   same mapping, so paths authored for array-shaped results still
///   resolve when the source delivered a single object;
/// - non-numeric segment: mapping key lookup only.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let normalized = normalize_path(path);
    let parts: Vec<&str> = normalized.split('.').collect();

    let mut current = root;
    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];

        if let Some(index) = parse_index(part) {
            match current {
                Value::Array(items) => {
                    let len = items.len() as i64;
                    let resolved = if index < 0 { index + len } else { index };
                    if resolved < 0 || resolved >= len {
                        return None;
                    }
                    current = &items[resolved as usize];
                }
                Value::Object(map) if map.contains_key(part) => {
                    // Array spread into an object with stringified keys.
                    current = &map[part];
                }
                Value::Object(_) if index == 0 => {
                    // Per-item fallback: path expects an array but the data
                    // is a single object. Skip the index segment.
                    i += 1;
                    continue;
                }
                _ => return None,
            }
        } else {
            match current {
                Value::Object(map) => current = map.get(part)?,
                _ => return None,
            }
        }

        i += 1;
    }

    Some(current)
}

/// Rewrites bracket indexing to dot segments.
fn normalize_path(path: &str) -> Cow<'_, str> {
    BRACKET_INDEX.replace_all(path, ".$1")
}

/// Parses a segment as an integer index (optional leading `-`).
fn parse_index(segment: &str) -> Option<i64> {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
