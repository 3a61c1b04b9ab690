//! Lenient parsing of provider responses
//!
//! Vision models wrap JSON in markdown fences, leave trailing commas and add
//! prose around the payload. Cleanup proceeds in order until one candidate
//! parses:
//!
//! 1. strip code fences
//! 2. remove trailing commas before `}` or `]`
//! 3. fall back to the outermost `{...}` span, then the outermost `[...]` span
//!
//! Only a JSON object is accepted as a payload.

use crate::error::ExtractorError;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Parse a provider response into a JSON object
pub fn parse_response(response: &str) -> Result<Map<String, Value>, ExtractorError> {
    let value = parse_value(response)?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(ExtractorError::InvalidFormat(
            "Expected a JSON object, got an array".to_string(),
        )),
        other => Err(ExtractorError::InvalidFormat(format!(
            "Expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

/// Parse a provider response into any JSON value, applying the cleanup steps
pub fn parse_value(response: &str) -> Result<Value, ExtractorError> {
    let stripped = strip_fences(response);
    if stripped.is_empty() {
        return Err(ExtractorError::InvalidFormat("Empty response".to_string()));
    }

    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        return Ok(value);
    }

    let cleaned = remove_trailing_commas(stripped)?;
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        debug!("Parsed response after removing trailing commas");
        return Ok(value);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(span) = outermost_span(&cleaned, open, close) {
            if let Ok(value) = serde_json::from_str::<Value>(span) {
                debug!(open = %open, "Parsed response from embedded span");
                return Ok(value);
            }
        }
    }

    let preview: String = stripped.chars().take(80).collect();
    Err(ExtractorError::InvalidFormat(format!(
        "No parseable JSON in response: {}",
        preview
    )))
}

/// Remove a surrounding markdown code fence, if any
fn strip_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    // Skip the fence marker and its language tag
    let after_marker = &trimmed[start + 3..];
    let body_start = after_marker.find('\n').map(|i| i + 1).unwrap_or(after_marker.len());
    let body = &after_marker[body_start..];

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn remove_trailing_commas(text: &str) -> Result<String, ExtractorError> {
    let pattern = Regex::new(r",\s*([}\]])")
        .map_err(|e| ExtractorError::InvalidFormat(format!("Bad cleanup pattern: {}", e)))?;
    Ok(pattern.replace_all(text, "$1").into_owned())
}

fn outermost_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let map = parse_response(r#"{"rooms": []}"#).unwrap();
        assert!(map.contains_key("rooms"));
    }

    #[test]
    fn test_fenced_object() {
        let response = "```json\n{\"distribution_boards\": [{\"name\": \"DB-1\"}]}\n```";
        let map = parse_response(response).unwrap();
        assert_eq!(map["distribution_boards"][0]["name"], "DB-1");
    }

    #[test]
    fn test_fence_with_prose() {
        let response = "Here is the extraction:\n```\n{\"rooms\": []}\n```\nLet me know.";
        assert!(parse_response(response).is_ok());
    }

    #[test]
    fn test_trailing_commas() {
        let response = r#"{"rooms": [{"name": "Kitchen", "fixtures": {"downlight_led_6w": 4,},},],}"#;
        let map = parse_response(response).unwrap();
        assert_eq!(map["rooms"][0]["fixtures"]["downlight_led_6w"], 4);
    }

    #[test]
    fn test_embedded_object() {
        let response = r#"The board schedule reads {"distribution_boards": []} as shown."#;
        let map = parse_response(response).unwrap();
        assert!(map["distribution_boards"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_array_is_rejected() {
        let result = parse_response(r#"[{"name": "Kitchen"}]"#);
        assert!(matches!(result, Err(ExtractorError::InvalidFormat(_))));
    }

    #[test]
    fn test_embedded_array_parses_as_value() {
        let value = parse_value("rooms: [1, 2, 3] end").unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_response("I could not read this drawing.").is_err());
        assert!(parse_response("").is_err());
        assert!(parse_response("```json\n```").is_err());
    }
}
