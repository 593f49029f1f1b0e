//! Tolerant JSON recovery from free-form model output.
//!
//! Models are asked for bare JSON but routinely wrap it in markdown fences
//! or surrounding prose anyway. The ladder below tries progressively more
//! forgiving strategies; the first one that parses wins.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("No JSON object or array could be recovered from the model response")]
pub struct JsonExtractionError;

pub fn extract_json(text: &str) -> Result<Value, JsonExtractionError> {
    let text = text.trim();

    // 1. The whole response is already valid JSON.
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    // 2. A fenced code block, optionally tagged `json`.
    if let Some(inner) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str(inner) {
            return Ok(value);
        }
    }

    // 3. An object embedded in prose. The scan is depth-aware and skips
    //    string literals, so braces inside string values cannot truncate
    //    the span.
    if let Some(candidate) = delimited_span(text, '{', '}') {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Ok(value);
        }
    }

    // 4. A bare top-level array.
    if let Some(candidate) = delimited_span(text, '[', ']') {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Ok(value);
        }
    }

    Err(JsonExtractionError)
}

/// Returns the interior of the first ``` fence pair, skipping an optional
/// language tag on the opening line.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = match after.find('\n') {
        // Tag (or nothing) up to the end of the opening line.
        Some(newline) if after[..newline].trim().len() <= 8 => newline + 1,
        _ => 0,
    };
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Finds the first `open` delimiter and returns the span through its
/// matching `close`, tracking nesting depth and escape sequences.
fn delimited_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(&text[start..start + i + c.len_utf8()]);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_round_trips() {
        let original = serde_json::json!({"a": 1, "b": ["x", "y"], "c": {"d": null}});
        let text = serde_json::to_string(&original).unwrap();
        assert_eq!(extract_json(&text).unwrap(), original);
    }

    #[test]
    fn fenced_block_with_surrounding_prose() {
        let text = "Here you go:\n```json\n{\"a\":1}\n```\nHope that helps!";
        assert_eq!(extract_json(text).unwrap(), serde_json::json!({"a": 1}));
    }

    #[test]
    fn fence_without_language_tag() {
        let text = "```\n{\"a\":1}\n```";
        assert_eq!(extract_json(text).unwrap(), serde_json::json!({"a": 1}));
    }

    #[test]
    fn object_wrapped_in_prose() {
        let text = "Sure! Here is your data: {\"name\":\"Jane\"} — let me know.";
        assert_eq!(
            extract_json(text).unwrap(),
            serde_json::json!({"name": "Jane"})
        );
    }

    #[test]
    fn braces_inside_string_values_do_not_truncate() {
        let text = "Result: {\"note\":\"uses {placeholders} and a } brace\",\"ok\":true} done";
        assert_eq!(
            extract_json(text).unwrap(),
            serde_json::json!({"note": "uses {placeholders} and a } brace", "ok": true})
        );
    }

    #[test]
    fn escaped_quotes_inside_strings_are_handled() {
        let text = "x {\"quote\":\"she said \\\"hi\\\"\"} y";
        assert_eq!(
            extract_json(text).unwrap(),
            serde_json::json!({"quote": "she said \"hi\""})
        );
    }

    #[test]
    fn bare_top_level_array() {
        let text = "The skills are: [\"rust\", \"sql\"] as requested.";
        assert_eq!(
            extract_json(text).unwrap(),
            serde_json::json!(["rust", "sql"])
        );
    }

    #[test]
    fn nested_objects_keep_their_full_span() {
        let text = "prefix {\"outer\":{\"inner\":{\"deep\":1}}} suffix";
        assert_eq!(
            extract_json(text).unwrap(),
            serde_json::json!({"outer": {"inner": {"deep": 1}}})
        );
    }

    #[test]
    fn plain_prose_fails() {
        assert!(extract_json("no json here").is_err());
    }

    #[test]
    fn unbalanced_braces_fail() {
        assert!(extract_json("broken {\"a\": 1").is_err());
    }
}
