//! Typed values for attributes and text content
//!
//! Every attribute key and text-bearing element key declares one of a small
//! set of value types. Parsing converts raw XML text into the declared type
//! and generation converts it back, so a round-tripped document preserves
//! value semantics, not just strings.

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::error::{Error, Result};

/// The declared type of an attribute value or element text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Plain text, stored as-is.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// Boolean; accepts `true`/`false`/`1`/`0`, emits `true`/`false`.
    Boolean,
    /// A URI reference. Stored textually; declared separately from String
    /// so schema validators can tell the two apart.
    Uri,
    /// An RFC 3339 date-time with offset.
    DateTime,
}

impl ValueType {
    /// Human-readable name used in conversion error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "floating-point number",
            ValueType::Boolean => "boolean",
            ValueType::Uri => "URI",
            ValueType::DateTime => "RFC 3339 date-time",
        }
    }
}

/// A typed value held by an attribute or text node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain text.
    String(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// URI reference, kept textual.
    Uri(String),
    /// Date-time with offset.
    DateTime(DateTime<FixedOffset>),
}

impl Value {
    /// Convert raw XML text into a value of the given type.
    ///
    /// Fails with a `[E3002]` value error naming the expected type and the
    /// offending text. Float values must be finite.
    pub fn from_text(value_type: ValueType, text: &str) -> Result<Value> {
        let fail = || Error::value_with_context("text", text, value_type.name());
        match value_type {
            ValueType::String => Ok(Value::String(text.to_string())),
            ValueType::Uri => Ok(Value::Uri(text.to_string())),
            ValueType::Integer => text
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| fail()),
            ValueType::Float => {
                let f = text.parse::<f64>().map_err(|_| fail())?;
                if !f.is_finite() {
                    return Err(fail());
                }
                Ok(Value::Float(f))
            }
            ValueType::Boolean => match text {
                "true" | "1" => Ok(Value::Boolean(true)),
                "false" | "0" => Ok(Value::Boolean(false)),
                _ => Err(fail()),
            },
            ValueType::DateTime => DateTime::parse_from_rfc3339(text)
                .map(Value::DateTime)
                .map_err(|_| fail()),
        }
    }

    /// The type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Uri(_) => ValueType::Uri,
            Value::DateTime(_) => ValueType::DateTime,
        }
    }

    /// Serialize the value back to XML text. Exact inverse of
    /// [`Value::from_text`] for every value this crate produces.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) | Value::Uri(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    /// Borrow textual content for `String` and `Uri` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Uri(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The float payload, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `Boolean`.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The date-time payload, if this is a `DateTime`.
    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversion() {
        let v = Value::from_text(ValueType::Integer, "42").unwrap();
        assert_eq!(v, Value::Integer(42));
        assert_eq!(v.to_text(), "42");
        assert!(Value::from_text(ValueType::Integer, "4.2").is_err());
        assert!(Value::from_text(ValueType::Integer, "abc").is_err());
    }

    #[test]
    fn test_boolean_conversion() {
        assert_eq!(
            Value::from_text(ValueType::Boolean, "1").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Value::from_text(ValueType::Boolean, "false").unwrap(),
            Value::Boolean(false)
        );
        assert!(Value::from_text(ValueType::Boolean, "yes").is_err());
        // canonical output regardless of input spelling
        assert_eq!(Value::from_text(ValueType::Boolean, "0").unwrap().to_text(), "false");
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(Value::from_text(ValueType::Float, "NaN").is_err());
        assert!(Value::from_text(ValueType::Float, "inf").is_err());
        assert_eq!(
            Value::from_text(ValueType::Float, "2.5").unwrap(),
            Value::Float(2.5)
        );
    }

    #[test]
    fn test_datetime_round_trip() {
        let v = Value::from_text(ValueType::DateTime, "2009-01-01T10:00:00Z").unwrap();
        let text = v.to_text();
        let again = Value::from_text(ValueType::DateTime, &text).unwrap();
        assert_eq!(v, again);
    }

    #[test]
    fn test_datetime_rejects_bare_date() {
        // RFC 3339 requires a time component
        assert!(Value::from_text(ValueType::DateTime, "2009-01-01").is_err());
    }

    #[test]
    fn test_error_names_expected_type() {
        let err = Value::from_text(ValueType::Integer, "abc").unwrap_err();
        assert!(err.to_string().contains("integer"));
        assert!(err.to_string().contains("'abc'"));
    }
}
