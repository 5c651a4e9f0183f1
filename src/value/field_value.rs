//! Native field value representation
//!
//! A `FieldValue` is a strict tree: every list element and map entry is
//! owned by exactly one parent, there are no back-references and no shared
//! mutable state between records.

use std::hash::{Hash, Hasher};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// One native value held by a validated record.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 text. Decimal, uuid and date-time fields are stored here in
    /// their canonical textual form.
    String(String),
    /// Boolean
    Bool(bool),
    /// Ordered sequence
    List(Vec<FieldValue>),
    /// String-keyed entries in insertion (declaration) order
    Map(Vec<(String, FieldValue)>),
    /// Absent optional value
    None,
}

impl FieldValue {
    /// Returns the tag name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::Bool(_) => "boolean",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
            FieldValue::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FieldValue::None)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, FieldValue)]> {
        match self {
            FieldValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Numeric view used by range constraints. Decimal text is parsed here,
    /// which is the only way a `String` reaches a numeric check.
    pub(crate) fn numeric(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Converts the tree into a `serde_json::Value`.
    ///
    /// Object keys keep their stored order.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Int(i) => Value::from(*i),
            // Coercion only admits finite floats; a hand-built NaN or
            // infinity has no JSON form and becomes null.
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            FieldValue::None => Value::Null,
        }
    }

    /// Builds a value from parsed JSON without any schema guidance.
    ///
    /// Integers that fit in `i64` become `Int`; every other number becomes
    /// `Float`.
    pub fn from_json(value: &Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::None,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s.clone()),
            Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from_json).collect()),
            Value::Object(map) => FieldValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Bit pattern used for float equality and hashing. Negative zero folds
/// into positive zero and every NaN into one canonical NaN so that `Eq` and
/// `Hash` agree.
fn float_key(f: f64) -> u64 {
    if f == 0.0 {
        0.0f64.to_bits()
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => float_key(*a) == float_key(*b),
            (FieldValue::String(a), FieldValue::String(b)) => a == b,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::List(a), FieldValue::List(b)) => a == b,
            (FieldValue::Map(a), FieldValue::Map(b)) => a == b,
            (FieldValue::None, FieldValue::None) => true,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Int(i) => i.hash(state),
            FieldValue::Float(f) => float_key(*f).hash(state),
            FieldValue::String(s) => s.hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::List(items) => items.hash(state),
            FieldValue::Map(entries) => entries.hash(state),
            FieldValue::None => {}
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FieldValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            FieldValue::None => serializer.serialize_none(),
        }
    }
}
