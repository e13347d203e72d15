//! Input sanitization.
//!
//! Best-effort, infallible cleanup applied to the raw request payload before
//! any validation rule runs. String leaves lose NUL bytes, get trimmed and
//! truncated, and — when they contain markup — pass through a small
//! allow-list HTML sanitizer. Oversized numeric leaves reset to zero.
//! Sanitization never fails; it only produces a possibly-altered but always
//! well-typed payload.

use serde_json::Value;

/// Longest string value kept after truncation.
pub const MAX_STRING_LENGTH: usize = 10_000;
/// Numeric leaves with a longer textual form than this reset to zero.
pub const MAX_NUMERIC_DIGITS: usize = 20;

/// Cap on `sort_columns` / `sort_directions` arrays.
pub const MAX_SORT_ITEMS: usize = 5;
/// Cap on the `search_columns` array.
pub const MAX_SEARCH_COLUMN_ITEMS: usize = 10;
/// Cap on entity name arrays.
pub const MAX_NAME_ITEMS: usize = 50;
/// Cap on generic id lists.
pub const MAX_ID_ITEMS: usize = 100;

/// Tags the HTML sanitizer keeps; everything else is stripped.
const ALLOWED_TAGS: &[&str] = &["p", "br", "strong", "em", "ul", "ol", "li"];

/// Recursively sanitize a JSON payload in place.
pub fn sanitize_payload(value: &mut Value) {
    match value {
        Value::String(s) => {
            *s = sanitize_string(s);
        }
        Value::Number(n) => {
            if n.to_string().len() > MAX_NUMERIC_DIGITS {
                *value = Value::from(0);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                sanitize_payload(item);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                sanitize_payload(item);
            }
        }
        Value::Bool(_) | Value::Null => {}
    }
}

/// Sanitize a single string value: NUL strip, trim, truncate, and HTML
/// cleanup when the value contains angle brackets.
#[must_use]
pub fn sanitize_string(input: &str) -> String {
    let without_nul: String = input.chars().filter(|c| *c != '\0').collect();
    let trimmed = without_nul.trim();
    let truncated: String = trimmed.chars().take(MAX_STRING_LENGTH).collect();
    if truncated.contains('<') || truncated.contains('>') {
        sanitize_html(&truncated)
    } else {
        truncated
    }
}

/// Strip all markup except the allow-listed tag set. Kept tags are re-emitted
/// bare (no attributes survive, so inline event handlers vanish with them);
/// `javascript:` URI schemes in the remaining text are removed.
#[must_use]
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '<' {
            out.push(c);
            continue;
        }
        // Find the end of the tag; an unterminated '<' is dropped entirely.
        let mut end = None;
        for (i, tc) in input[start + 1..].char_indices() {
            if tc == '>' {
                end = Some(start + 1 + i);
                break;
            }
        }
        let Some(end) = end else {
            break;
        };
        let inner = &input[start + 1..end];
        let closing = inner.starts_with('/');
        let name_part = inner.trim_start_matches('/');
        let name: String = name_part
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if ALLOWED_TAGS.contains(&name.as_str()) {
            if closing {
                out.push_str(&format!("</{name}>"));
            } else {
                out.push_str(&format!("<{name}>"));
            }
        }
        // Skip past the consumed tag.
        while let Some(&(i, _)) = chars.peek() {
            if i > end {
                break;
            }
            chars.next();
        }
    }

    strip_scheme(&out, "javascript:")
}

/// Remove every occurrence of an ASCII URI scheme, case-insensitively.
/// Runs to a fixpoint so removals cannot splice a new occurrence together
/// (`javajavascript:script:` must not survive as `javascript:`).
fn strip_scheme(input: &str, scheme: &str) -> String {
    let mut current = strip_scheme_once(input, scheme);
    loop {
        let next = strip_scheme_once(&current, scheme);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn strip_scheme_once(input: &str, scheme: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let scheme_len = scheme.len();
    let mut i = 0;
    while i < bytes.len() {
        if i + scheme_len <= bytes.len()
            && bytes[i..i + scheme_len].eq_ignore_ascii_case(scheme.as_bytes())
        {
            i += scheme_len;
            continue;
        }
        let ch_len = input[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&input[i..i + ch_len]);
        i += ch_len;
    }
    out
}

/// Permissive boolean parsing: `true`, `1`, `yes`, `on` (case-insensitive)
/// are truthy; everything else is false.
#[must_use]
pub fn parse_bool_str(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Permissive boolean parsing over a JSON value.
#[must_use]
pub fn parse_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => parse_bool_str(s),
        Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
        _ => false,
    }
}

/// Keep only non-empty trimmed strings, up to `cap` of them.
#[must_use]
pub fn normalize_string_array(values: &[Value], cap: usize) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .take(cap)
        .collect()
}

/// Keep only `ASC`/`DESC` entries, upper-cased, up to the sort cap.
#[must_use]
pub fn normalize_direction_array(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| s == "ASC" || s == "DESC")
        .take(MAX_SORT_ITEMS)
        .collect()
}

/// Keep only plausible identifiers: positive integers and UUID-shaped
/// strings, up to the id cap.
#[must_use]
pub fn normalize_id_array(values: &[Value]) -> Vec<Value> {
    values
        .iter()
        .filter(|v| match v {
            Value::Number(n) => n.as_i64().is_some_and(|i| i > 0),
            Value::String(s) => uuid::Uuid::parse_str(s.trim()).is_ok(),
            _ => false,
        })
        .cloned()
        .take(MAX_ID_ITEMS)
        .collect()
}
