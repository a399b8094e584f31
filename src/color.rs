//! Color validation primitives
//!
//! Pure helpers shared by the provider contract: hex-color validation and
//! provider-option shape validation. No I/O, no state.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Pattern every palette entry must match
static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex color pattern is valid"));

/// Check whether a string is a six-digit hex color code such as `#1A2B3C`
pub fn is_valid_hex_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value)
}

/// Check whether provider options are well-formed
///
/// Option values are forwarded verbatim into vendor request bodies, so only
/// scalar values (strings, numbers, booleans) are accepted. Keys must be
/// non-empty.
pub fn is_valid_provider_options(options: &HashMap<String, Value>) -> bool {
    options.iter().all(|(key, value)| {
        !key.is_empty()
            && matches!(
                value,
                Value::String(_) | Value::Number(_) | Value::Bool(_)
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_hex_colors() {
        assert!(is_valid_hex_color("#FF0000"));
        assert!(is_valid_hex_color("#00ff00"));
        assert!(is_valid_hex_color("#1A2b3C"));
    }

    #[test]
    fn test_invalid_hex_colors() {
        assert!(!is_valid_hex_color("red"));
        assert!(!is_valid_hex_color("#12345"));
        assert!(!is_valid_hex_color("#1234567"));
        assert!(!is_valid_hex_color("#GGGGGG"));
        assert!(!is_valid_hex_color("FF0000"));
        assert!(!is_valid_hex_color(""));
    }

    #[test]
    fn test_scalar_options_are_valid() {
        let mut options = HashMap::new();
        options.insert("temperature".to_string(), json!(0.4));
        options.insert("style".to_string(), json!("pastel"));
        options.insert("vivid".to_string(), json!(true));
        assert!(is_valid_provider_options(&options));
    }

    #[test]
    fn test_non_scalar_options_are_rejected() {
        let mut options = HashMap::new();
        options.insert("nested".to_string(), json!({"a": 1}));
        assert!(!is_valid_provider_options(&options));

        let mut options = HashMap::new();
        options.insert("list".to_string(), json!([1, 2]));
        assert!(!is_valid_provider_options(&options));

        let mut options = HashMap::new();
        options.insert(String::new(), json!("x"));
        assert!(!is_valid_provider_options(&options));
    }
}
