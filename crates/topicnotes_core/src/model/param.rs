//! Loosely-typed call arguments.
//!
//! RPC callers may send any JSON value in a string slot. `Param` keeps the
//! received shape so the service can distinguish a blank string from a value
//! that is not a string at all.

use serde_json::Value;

/// One positional argument as received from a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Nil,
    /// Arrays, objects, or numbers outside the `i64`/`f64` range.
    Other(String),
}

impl Param {
    /// Returns the string content when this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// `true` for a whitespace-only string or a missing value.
    ///
    /// Non-string values are never blank; they fail the type check instead.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(value) => value.trim().is_empty(),
            Self::Nil => true,
            _ => false,
        }
    }

    /// Short type label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Nil => "nil",
            Self::Other(_) => "other",
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Bool(flag) => Self::Boolean(flag),
            Value::Null => Self::Nil,
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Self::Integer(int)
                } else if let Some(float) = number.as_f64() {
                    Self::Float(float)
                } else {
                    Self::Other(number.to_string())
                }
            }
            other => Self::Other(other.to_string()),
        }
    }
}
