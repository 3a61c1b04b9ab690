//! Forgiving field decoders for payload schemas
//!
//! Models emit `"20"` where `20` was asked for, `"yes"` for `true`, `null` for
//! an empty list. These decoders accept those shapes and map anything they
//! cannot read to `None` rather than failing the whole payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Read a number from a JSON number or a numeric string ("2.5", "2.5mm²", "20A")
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Read a non-negative count
pub fn count_of(value: &Value) -> Option<u32> {
    number_of(value)
        .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n.round() as u32)
}

/// Read a boolean from a bool, a yes/no string or a number
pub fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a string from a string or a number
pub fn string_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_of))
}

pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_of))
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(bool_of))
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(string_of))
}

/// A list of strings; a bare string becomes a one-element list
pub(crate) fn texts<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(string_of).collect(),
        Some(other) => string_of(&other).into_iter().collect(),
        None => Vec::new(),
    })
}

/// A list of records; `null` reads as empty
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A flat key/value map; anything other than an object reads as empty
pub(crate) fn map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_from_strings() {
        assert_eq!(number_of(&json!("2.5")), Some(2.5));
        assert_eq!(number_of(&json!("2.5mm²")), Some(2.5));
        assert_eq!(number_of(&json!(" 20A")), Some(20.0));
        assert_eq!(number_of(&json!("-3")), Some(-3.0));
        assert_eq!(number_of(&json!("n/a")), None);
        assert_eq!(number_of(&json!(null)), None);
    }

    #[test]
    fn test_counts_are_non_negative() {
        assert_eq!(count_of(&json!(8)), Some(8));
        assert_eq!(count_of(&json!("12")), Some(12));
        assert_eq!(count_of(&json!(-1)), None);
        assert_eq!(count_of(&json!(2.6)), Some(3));
    }

    #[test]
    fn test_bools() {
        assert_eq!(bool_of(&json!(true)), Some(true));
        assert_eq!(bool_of(&json!("Yes")), Some(true));
        assert_eq!(bool_of(&json!("no")), Some(false));
        assert_eq!(bool_of(&json!(0)), Some(false));
        assert_eq!(bool_of(&json!("maybe")), None);
    }

    #[test]
    fn test_strings() {
        assert_eq!(string_of(&json!(" DB-1 ")), Some("DB-1".to_string()));
        assert_eq!(string_of(&json!(3)), Some("3".to_string()));
        assert_eq!(string_of(&json!([1])), None);
    }
}
