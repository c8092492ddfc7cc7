//! Best-effort recovery of structured values from malformed JSON text.
//!
//! Agent responses are *supposed* to be JSON but frequently arrive wrapped in
//! markdown code fences, truncated mid-document, or written with relaxed
//! syntax (unquoted keys, single quotes, trailing commas). Recovery runs in
//! stages:
//!
//! 1. strict `serde_json` parse
//! 2. lenient JSON5 parse (trailing commas, comments, unquoted keys,
//!    single-quoted strings)
//! 3. structural repair (strip trailing commas, balance quotes, close open
//!    brackets) followed by another strict-then-lenient pass
//!
//! When every stage fails the original text is returned unchanged as a JSON
//! string value. This function never panics and never swallows usable text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Maximum number of characters of the offending text included in logs.
const LOG_EXCERPT_CHARS: usize = 120;

static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",\s*([}\]])").expect("trailing-comma pattern is valid")
});

/// Salvage a value that may be a JSON document serialized into a string.
///
/// Non-string values are already structured and pass through unchanged.
pub fn salvage(value: Value) -> Value {
    match value {
        Value::String(text) => salvage_str(&text),
        other => other,
    }
}

/// Salvage a structured value from text that resembles JSON.
///
/// Text that does not look like a JSON document (no leading `{` or `[`)
/// is prose and is returned unchanged.
pub fn salvage_str(text: &str) -> Value {
    let candidate = strip_code_fence(text.trim());

    if !candidate.starts_with('{') && !candidate.starts_with('[') {
        return Value::String(text.to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return value;
    }

    if let Ok(value) = json5::from_str::<Value>(candidate) {
        return value;
    }

    let repaired = repair(candidate);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
        return value;
    }
    if let Ok(value) = json5::from_str::<Value>(&repaired) {
        return value;
    }

    tracing::warn!(
        excerpt = %excerpt(candidate),
        "all salvage attempts failed, returning original text"
    );
    Value::String(text.to_string())
}

/// Strip a surrounding markdown code fence (```` ```json ... ``` ````).
///
/// Agents often wrap their JSON output this way; the fence language tag is
/// ignored.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the fence line ("```json", "```", ...).
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => return text,
    };
    match body.rfind("```") {
        Some(idx) => body[..idx].trim(),
        None => body.trim(),
    }
}

/// Apply structural repairs for common truncation and formatting defects.
///
/// - trailing commas before a closing bracket are removed
/// - an unterminated string literal gets its closing quote
/// - unclosed brackets and braces are closed in stack order
fn repair(text: &str) -> String {
    let mut repaired = TRAILING_COMMA.replace_all(text, "$1").into_owned();

    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in repaired.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    if in_string {
        repaired.push('"');
    }
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }
    repaired
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= LOG_EXCERPT_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(LOG_EXCERPT_CHARS).collect();
        format!("{}...", head)
    }
}
