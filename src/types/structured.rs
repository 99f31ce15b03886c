//! Option values that may arrive either as JSON text or as structured data.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured option as supplied by the caller or the environment.
///
/// Environment variables and CLI flags can only carry text, while library
/// callers usually pass structured JSON. Both shapes are accepted and the raw
/// form is parsed once, during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuredValue {
    Raw(String),
    Parsed(Value),
}

impl StructuredValue {
    /// Parses raw text as JSON; structured values pass through unchanged.
    pub fn into_value(self) -> Result<Value, ValidationError> {
        match self {
            Self::Raw(text) => serde_json::from_str(&text)
                .map_err(|e| ValidationError::MalformedJson(e.to_string())),
            Self::Parsed(value) => Ok(value),
        }
    }

    /// Resolves to a JSON object. `null` and empty text count as an empty object.
    pub fn into_object(self) -> Result<Map<String, Value>, ValidationError> {
        if matches!(&self, Self::Raw(text) if text.trim().is_empty()) {
            return Ok(Map::new());
        }
        match self.into_value()? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(ValidationError::UnexpectedShape {
                expected: "a JSON object",
                found: json_kind(&other),
            }),
        }
    }

    /// Resolves to a JSON object or `null`. Empty text counts as `null`.
    pub fn into_optional_object(self) -> Result<Value, ValidationError> {
        if matches!(&self, Self::Raw(text) if text.trim().is_empty()) {
            return Ok(Value::Null);
        }
        match self.into_value()? {
            value @ (Value::Object(_) | Value::Null) => Ok(value),
            other => Err(ValidationError::UnexpectedShape {
                expected: "a JSON object or null",
                found: json_kind(&other),
            }),
        }
    }
}

impl From<Value> for StructuredValue {
    fn from(value: Value) -> Self {
        Self::Parsed(value)
    }
}

impl From<&str> for StructuredValue {
    fn from(text: &str) -> Self {
        Self::Raw(text.to_string())
    }
}

impl From<String> for StructuredValue {
    fn from(text: String) -> Self {
        Self::Raw(text)
    }
}

/// Human-readable name of a JSON value's kind.
pub fn json_kind(value: &Value) -> &'static str {
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
    use serde_json::json;

    #[test]
    fn test_raw_text_is_parsed() {
        let value = StructuredValue::from(r#"{"q":"rust","count":5}"#)
            .into_object()
            .unwrap();
        assert_eq!(Value::Object(value), json!({"q": "rust", "count": 5}));
    }

    #[test]
    fn test_parsed_value_passes_through() {
        let value = StructuredValue::from(json!({"track": ["a", "b"]}))
            .into_object()
            .unwrap();
        assert_eq!(value["track"], json!(["a", "b"]));
    }

    #[test]
    fn test_malformed_text_is_rejected() {
        let err = StructuredValue::from("{q: twitter}").into_object().unwrap_err();
        assert!(matches!(err, ValidationError::MalformedJson(_)));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let err = StructuredValue::from("[1,2]").into_object().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnexpectedShape {
                expected: "a JSON object",
                found: "an array"
            }
        );
        assert!(StructuredValue::from("42").into_optional_object().is_err());
    }

    #[test]
    fn test_empty_text_and_null() {
        assert!(StructuredValue::from("").into_object().unwrap().is_empty());
        assert_eq!(
            StructuredValue::from("null").into_optional_object().unwrap(),
            Value::Null
        );
        assert_eq!(
            StructuredValue::from("  ").into_optional_object().unwrap(),
            Value::Null
        );
    }
}
