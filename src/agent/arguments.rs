//! Normalization of tool-call arguments as they arrive from the model.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::tools::ToolArgs;

/// Arguments the model sent that cannot be turned into a parameter mapping.
#[derive(Debug, Error, PartialEq)]
pub enum ArgumentError {
    #[error("tool arguments not valid JSON: {raw}")]
    Malformed { raw: String },

    #[error("tool arguments must be object, got {kind}")]
    InvalidShape { kind: &'static str },
}

/// The shapes `arguments` shows up in on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArguments {
    Map(Map<String, Value>),
    Encoded(String),
    Absent,
    Other(Value),
}

impl From<Option<Value>> for RawArguments {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::Object(map)) => RawArguments::Map(map),
            Some(Value::String(s)) => RawArguments::Encoded(s),
            Some(Value::Null) | None => RawArguments::Absent,
            Some(other) => RawArguments::Other(other),
        }
    }
}

impl RawArguments {
    /// Resolve into a single mapping, decoding string-encoded JSON.
    pub fn normalize(self) -> Result<ToolArgs, ArgumentError> {
        match self {
            RawArguments::Map(map) => Ok(ToolArgs::new(map)),
            RawArguments::Absent => Ok(ToolArgs::default()),
            RawArguments::Encoded(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => Ok(ToolArgs::new(map)),
                Ok(other) => Err(ArgumentError::InvalidShape {
                    kind: kind_of(&other),
                }),
                Err(_) => Err(ArgumentError::Malformed { raw }),
            },
            RawArguments::Other(value) => Err(ArgumentError::InvalidShape {
                kind: kind_of(&value),
            }),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Option<Value>) -> Result<ToolArgs, ArgumentError> {
        RawArguments::from(value).normalize()
    }

    #[test]
    fn mapping_passes_through() {
        let args = normalize(Some(json!({ "path": "a.txt", "limit": 2 }))).unwrap();
        assert_eq!(args.str("path").unwrap(), "a.txt");
        assert_eq!(args.opt_int("limit").unwrap(), Some(2));
    }

    #[test]
    fn encoded_mapping_is_decoded() {
        let args = normalize(Some(json!("{\"cmd\": \"ls -la\"}"))).unwrap();
        assert_eq!(args.str("cmd").unwrap(), "ls -la");
    }

    #[test]
    fn malformed_string_is_an_argument_error() {
        let err = normalize(Some(json!("{not json"))).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::Malformed {
                raw: "{not json".to_string()
            }
        );
        assert_eq!(err.to_string(), "tool arguments not valid JSON: {not json");
    }

    #[test]
    fn absent_or_null_is_empty() {
        assert_eq!(normalize(None).unwrap(), ToolArgs::default());
        assert_eq!(normalize(Some(Value::Null)).unwrap(), ToolArgs::default());
    }

    #[test]
    fn other_shapes_are_rejected() {
        assert_eq!(
            normalize(Some(json!([1, 2]))).unwrap_err(),
            ArgumentError::InvalidShape { kind: "array" }
        );
        assert_eq!(
            normalize(Some(json!(5))).unwrap_err().to_string(),
            "tool arguments must be object, got number"
        );
        assert_eq!(
            normalize(Some(json!("[1]"))).unwrap_err(),
            ArgumentError::InvalidShape { kind: "array" }
        );
    }
}
