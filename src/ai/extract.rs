//! JSON extraction from model output
//!
//! Vendors frequently wrap the requested JSON in prose or markdown fences.
//! This module isolates the scraping step: find the first embedded JSON value
//! in a completion and decode it. Extraction failure is a malformed-response
//! error, never a panic.

use crate::error::{PaletteForgeError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Markdown code fence, optionally tagged `json`
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence pattern is valid")
});

/// Extract the first JSON value embedded in a completion
///
/// Tries, in order: the whole trimmed text, the contents of the first
/// markdown code fence, and the first balanced `{...}` or `[...]` span.
pub fn extract_json(provider: &str, text: &str) -> Result<Value> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(caps) = FENCE_RE.captures(trimmed) {
        if let Ok(value) = serde_json::from_str(caps[1].trim()) {
            return Ok(value);
        }
    }

    if let Some(span) = first_json_span(trimmed) {
        if let Ok(value) = serde_json::from_str(span) {
            return Ok(value);
        }
    }

    Err(PaletteForgeError::malformed(
        provider,
        "no JSON value found in model output",
    ))
}

/// Locate the first balanced JSON object or array in `text`
///
/// Tracks string literals and escapes so braces inside strings don't
/// unbalance the scan.
fn first_json_span(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;
    let (open, close) = if bytes[start] == b'{' {
        (b'{', b'}')
    } else {
        (b'[', b']')
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
