//! Scalar values exchanged with the store and emitted in results.

use serde::{Serialize, Serializer};

use crate::schema::FieldType;
use crate::sql::{lit_float, lit_int, lit_null, lit_str, Expr};

/// A scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a raw store value to the declared type of its attribute.
    ///
    /// Booleans arrive as integers, enums as their stored integer, and
    /// floats may arrive as integers. Values that do not fit the declared
    /// type pass through unchanged.
    pub fn typed(self, field_type: &FieldType) -> Value {
        match (field_type, self) {
            (FieldType::Boolean, Value::Int(n)) => Value::Bool(n != 0),
            (FieldType::Float, Value::Int(n)) => Value::Float(n as f64),
            (FieldType::Enum(mapping), Value::Int(n)) => match mapping.label(n) {
                Some(label) => Value::Text(label.to_string()),
                None => Value::Int(n),
            },
            (FieldType::String | FieldType::Text, Value::Int(n)) => Value::Text(n.to_string()),
            (_, value) => value,
        }
    }

    /// Key used to match parent and child rows; `None` for null.
    pub fn key(&self) -> Option<RowKey> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(RowKey::Int(i64::from(*b))),
            Value::Int(n) => Some(RowKey::Int(*n)),
            Value::Float(f) => Some(RowKey::Text(f.to_string())),
            Value::Text(s) => Some(RowKey::Text(s.clone())),
        }
    }

    /// SQL literal for this value.
    pub fn to_literal(&self) -> Expr {
        match self {
            Value::Null => lit_null(),
            Value::Bool(b) => Expr::from(*b),
            Value::Int(n) => lit_int(*n),
            Value::Float(f) if f.is_finite() => lit_float(*f),
            Value::Float(_) => lit_null(),
            Value::Text(s) => lit_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

/// Hashable identity of a key column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Int(i64),
    Text(String),
}

impl RowKey {
    pub fn to_literal(&self) -> Expr {
        match self {
            RowKey::Int(n) => lit_int(*n),
            RowKey::Text(s) => lit_str(s),
        }
    }
}
