//! Conversion between `serde_json::Value` and the yrs value types.

use std::collections::HashMap;

use serde_json::Value;
use yrs::types::ToJson;
use yrs::{Any, Array, GetString, Out, ReadTxn};

/// Convert serde_json::Value to yrs::Any.
///
/// Every number is stored as `Any::Number`; Y.js peers have no separate
/// integer type.
pub fn json_to_any(value: &Value) -> Any {
    match value {
        Value::Null => Any::Null,
        Value::Bool(b) => Any::Bool(*b),
        Value::Number(n) => n.as_f64().map(Any::Number).unwrap_or(Any::Null),
        Value::String(s) => Any::String(s.as_str().into()),
        Value::Array(arr) => {
            let items: Vec<Any> = arr.iter().map(json_to_any).collect();
            Any::Array(items.into())
        }
        Value::Object(obj) => {
            let map: HashMap<String, Any> = obj
                .iter()
                .map(|(k, v)| (k.clone(), json_to_any(v)))
                .collect();
            Any::Map(map.into())
        }
    }
}

/// Convert yrs::Any to serde_json::Value.
pub fn any_to_json(any: &Any) -> Value {
    match any {
        Any::Null | Any::Undefined => Value::Null,
        Any::Bool(b) => Value::Bool(*b),
        Any::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Any::BigInt(i) => Value::Number((*i).into()),
        Any::String(s) => Value::String(s.to_string()),
        Any::Buffer(b) => {
            // Encode buffer as base64 string
            use base64::Engine;
            Value::String(base64::engine::general_purpose::STANDARD.encode(b.as_ref()))
        }
        Any::Array(arr) => Value::Array(arr.iter().map(any_to_json).collect()),
        Any::Map(map) => {
            let obj: serde_json::Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), any_to_json(v)))
                .collect();
            Value::Object(obj)
        }
    }
}

/// Convert yrs::Out to serde_json::Value.
pub fn out_to_json<T: ReadTxn>(value: &Out, txn: &T) -> Value {
    match value {
        Out::Any(any) => any_to_json(any),
        Out::YText(text) => Value::String(text.get_string(txn)),
        Out::YArray(arr) => Value::Array(arr.iter(txn).map(|v| out_to_json(&v, txn)).collect()),
        Out::YMap(map) => any_to_json(&map.to_json(txn)),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yrs::{Doc, Map, MapPrelim, Text, TextPrelim, Transact};

    #[test]
    fn test_json_to_any_roundtrip() {
        let original = json!({
            "string": "hello",
            "float": 1.5,
            "bool": true,
            "null": null,
            "array": ["a", "b"],
            "object": {"nested": "value"}
        });

        let back = any_to_json(&json_to_any(&original));
        assert_eq!(original, back);
    }

    #[test]
    fn test_numbers_are_stored_as_floats() {
        let any = json_to_any(&json!({"count": 3}));
        let Any::Map(map) = any else {
            panic!("Expected map");
        };
        assert_eq!(map.get("count"), Some(&Any::Number(3.0)));
    }

    #[test]
    fn test_bigint_reads_as_integer() {
        assert_eq!(any_to_json(&Any::BigInt(42)), json!(42));
        assert!(any_to_json(&Any::BigInt(42)).is_i64());
    }

    #[test]
    fn test_buffer_reads_as_base64() {
        let any = Any::Buffer(vec![1u8, 2, 3].into());
        assert_eq!(any_to_json(&any), json!("AQID"));
    }

    #[test]
    fn test_out_to_json_nested_types() {
        let doc = Doc::new();
        let root = doc.get_or_insert_map("root");
        let mut txn = doc.transact_mut();
        let inner = root.insert(&mut txn, "inner", MapPrelim::default());
        let text = inner.insert(&mut txn, "text", TextPrelim::new("abc"));
        text.push(&mut txn, "d");

        let value = out_to_json(&Out::YMap(root.clone()), &txn);
        assert_eq!(value, json!({"inner": {"text": "abcd"}}));
    }
}
