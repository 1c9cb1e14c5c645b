use std::sync::Arc;

use crate::column::format_float;

/// Represents a single scalar value: a cell read out of a column, or a literal
/// used by a predicate expression.
///
/// Includes `Null`, which is what [`Column::get`](crate::Column::get) returns for a
/// row whose validity bit is cleared.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// represents an empty or missing value.
    Null,
    /// A 64-bit signed integer value.
    Int(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A UTF-8 string value, wrapped in an [Arc] for cheap cloning.
    Text(Arc<str>),
    /// A boolean value.
    Bool(bool),
}

impl Value {
    /// Returns the inner integer value if this is a [Value::Int].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the inner float value if this is a [Value::Float].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the inner boolean value if this is a [Value::Bool].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Coerces the value to an integer for comparison against an `Int64` column.
    ///
    /// Floats are truncated toward zero, text must parse as a base-10 integer.
    pub fn coerce_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) => Some(f.trunc() as i64),
            Self::Text(s) => s.parse().ok(),
            Self::Null | Self::Bool(_) => None,
        }
    }

    /// Coerces the value to a float for comparison against a `Float64` column.
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.parse().ok(),
            Self::Null | Self::Bool(_) => None,
        }
    }

    /// Default textual representation, `None` for [Value::Null].
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(format_float(*f)),
            Self::Text(s) => Some(s.to_string()),
            Self::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(v: Arc<str>) -> Self {
        Self::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : accessors
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Float(1.0).as_int(), None);
        assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Text("true".into()).as_bool(), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : integer coercion
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_coerce_i64() {
        assert_eq!(Value::Int(7).coerce_i64(), Some(7));
        assert_eq!(Value::Float(9.9).coerce_i64(), Some(9));
        assert_eq!(Value::Float(-9.9).coerce_i64(), Some(-9));
        assert_eq!(Value::from("-12").coerce_i64(), Some(-12));
        assert_eq!(Value::from("1.5").coerce_i64(), None);
        assert_eq!(Value::Bool(true).coerce_i64(), None);
        assert_eq!(Value::Null.coerce_i64(), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : float coercion
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_coerce_f64() {
        assert_eq!(Value::Int(3).coerce_f64(), Some(3.0));
        assert_eq!(Value::Float(0.25).coerce_f64(), Some(0.25));
        assert_eq!(Value::from("2.5").coerce_f64(), Some(2.5));
        assert_eq!(Value::from("abc").coerce_f64(), None);
        assert_eq!(Value::Bool(false).coerce_f64(), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : textual form
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_to_text() {
        assert_eq!(Value::Int(10).to_text().as_deref(), Some("10"));
        assert_eq!(Value::Float(3.0).to_text().as_deref(), Some("3"));
        assert_eq!(Value::Float(0.1).to_text().as_deref(), Some("0.1"));
        assert_eq!(Value::Float(2e6).to_text().as_deref(), Some("2e+06"));
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_text().as_deref(), Some("-Inf"));
        assert_eq!(Value::Bool(true).to_text().as_deref(), Some("true"));
        assert_eq!(Value::from("abc").to_text().as_deref(), Some("abc"));
        assert_eq!(Value::Null.to_text(), None);
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(Value::from(5_i32), Value::Int(5));
        assert_eq!(Value::from(5_i64), Value::Int(5));
        assert_eq!(Value::from(1.5), Value::Float(1.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(String::from("a")), Value::Text("a".into()));
    }
}
