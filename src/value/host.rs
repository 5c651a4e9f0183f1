//! Host value boundary
//!
//! Bindings for each host runtime translate their native objects into
//! `HostValue` before calling the engine, and read `HostValue` back out of
//! validated instances. The engine never sees a host object directly.

use serde_json::Value;

/// A raw value as handed over by a host binding.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Raw byte string. Coerced like its UTF-8 text.
    Bytes(Vec<u8>),
    /// Arbitrary-precision decimal carried as text.
    Decimal(String),
    List(Vec<HostValue>),
    /// Mapping with string keys in host iteration order.
    Map(Vec<(String, HostValue)>),
}

impl HostValue {
    /// Builds a byte-string value.
    pub fn bytes(data: impl AsRef<[u8]>) -> Self {
        HostValue::Bytes(data.as_ref().to_vec())
    }

    /// Builds a mapping from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<HostValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        HostValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the host type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "none",
            HostValue::Bool(_) => "boolean",
            HostValue::Int(_) => "integer",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "string",
            HostValue::Bytes(_) => "bytes",
            HostValue::Decimal(_) => "decimal",
            HostValue::List(_) => "list",
            HostValue::Map(_) => "map",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    /// Returns the entries of a mapping.
    pub fn as_map(&self) -> Option<&[(String, HostValue)]> {
        match self {
            HostValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a key in a mapping. The last occurrence wins when a host
    /// hands over duplicate keys.
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        self.as_map()?
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Converts to JSON for hosts that consume plain JSON values.
    ///
    /// Decimals become strings; bytes become their lossy UTF-8 text.
    pub fn to_json(&self) -> Value {
        match self {
            HostValue::None => Value::Null,
            HostValue::Bool(b) => Value::Bool(*b),
            HostValue::Int(i) => Value::from(*i),
            // Hosts may hand over NaN or infinity, which JSON cannot carry.
            HostValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            HostValue::Str(s) | HostValue::Decimal(s) => Value::String(s.clone()),
            HostValue::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            HostValue::List(items) => Value::Array(items.iter().map(HostValue::to_json).collect()),
            HostValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => HostValue::None,
            Value::Bool(b) => HostValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => HostValue::Int(i),
                None => HostValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => HostValue::Str(s),
            Value::Array(items) => HostValue::List(items.into_iter().map(HostValue::from).collect()),
            Value::Object(map) => {
                HostValue::Map(map.into_iter().map(|(k, v)| (k, HostValue::from(v))).collect())
            }
        }
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(s)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Int(i)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Int(i64::from(i))
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::List(items)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let host = HostValue::from(json!({"id": "123", "tags": [1, 2.5, null]}));
        assert_eq!(host.get("id"), Some(&HostValue::Str("123".into())));
        assert_eq!(
            host.get("tags"),
            Some(&HostValue::List(vec![
                HostValue::Int(1),
                HostValue::Float(2.5),
                HostValue::None
            ]))
        );
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let host = HostValue::from(value);
        let keys: Vec<&str> = host
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let host = HostValue::map([("a", 1), ("a", 2)]);
        assert_eq!(host.get("a"), Some(&HostValue::Int(2)));
    }

    #[test]
    fn test_decimal_renders_as_json_string() {
        let host = HostValue::Decimal("10.50".into());
        assert_eq!(host.to_json(), json!("10.50"));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(HostValue::from(None::<i64>), HostValue::None);
        assert_eq!(HostValue::from(Some("x")), HostValue::Str("x".into()));
    }
}
