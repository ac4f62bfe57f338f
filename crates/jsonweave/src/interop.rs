//! Conversions to and from [`serde_json::Value`]
//!
//! Strings coming from serde_json get the same placeholder detection as
//! parsed text. Going the other way, placeholders become their `~X:name`
//! strings, and a number serde_json cannot represent becomes `null`.

use std::sync::Arc;

use crate::value::{Map, Number, Value};

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from(&value)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                Value::Number(Number::from_validated(Arc::from(n.to_string())))
            }
            serde_json::Value::String(s) => Value::string_or_placeholder(s),
            serde_json::Value::Array(items) => items.iter().map(Value::from).collect(),
            serde_json::Value::Object(members) => Value::from_map(
                members
                    .iter()
                    .map(|(k, v)| (Arc::from(k.as_str()), Value::from(v)))
                    .collect::<Map>(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => n
                .as_str()
                .parse::<serde_json::Number>()
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Placeholder(p) => serde_json::Value::String(p.text()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        serde_json::Value::from(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_serde_keeps_order_and_placeholders() {
        let source = serde_json::json!({"z": 1, "a": ["~S:name", 2.5, null]});
        let value = Value::from(source);
        assert_eq!(value.to_string(), r#"{"z":1,"a":["~S:name",2.5,null]}"#);
        assert!(value.as_object().unwrap()["a"].as_array().unwrap()[0].is_placeholder());
    }

    #[test]
    fn test_to_serde() {
        let value = parse(r#"{"b":[true,"~N:n"],"a":-0.5}"#).unwrap();
        let converted = serde_json::Value::from(&value);
        assert_eq!(converted, serde_json::json!({"b": [true, "~N:n"], "a": -0.5}));
    }
}
