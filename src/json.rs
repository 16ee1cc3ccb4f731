//! JSON <-> runtime value conversions.
//!
//! Used at both HTTP boundaries: decoding the body of an outbound fetch
//! and encoding an endpoint's return value into the response body.
//!
//! Decoding maps JSON null to integer `0` (there is no way to spell the
//! absent value in source, so fetched nulls degrade to the integer
//! default); encoding maps the absent value to JSON null.

use indexmap::IndexMap;

use crate::value::Value;

/// Convert a decoded JSON document to a runtime value.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Integer(0),
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(elements) => {
            Value::Array(elements.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(members) => {
            let mut map = IndexMap::with_capacity(members.len());
            for (key, value) in members {
                map.insert(key, json_to_value(value));
            }
            Value::Object(map)
        }
    }
}

/// Convert a runtime value to a JSON document.
///
/// Non-finite floats have no JSON representation and become null.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::Number((*n).into()),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(elements) => {
            serde_json::Value::Array(elements.iter().map(value_to_json).collect())
        }
        Value::Object(members) => {
            let mut object = serde_json::Map::with_capacity(members.len());
            for (key, value) in members {
                object.insert(key.clone(), value_to_json(value));
            }
            serde_json::Value::Object(object)
        }
    }
}

/// Compact JSON encoding of a runtime value.
pub fn to_json_string(value: &Value) -> String {
    value_to_json(value).to_string()
}

#[test]
fn test_round_trip() {
    let mut members = IndexMap::new();
    members.insert("b".to_string(), Value::Integer(1));
    members.insert("a".to_string(), Value::Array(vec![
        Value::Float(2.5),
        Value::String("x".to_string()),
        Value::Boolean(true),
    ]));
    let value = Value::Object(members);

    let encoded = to_json_string(&value);
    assert_eq!(encoded, r#"{"b":1,"a":[2.5,"x",true]}"#);

    let decoded = json_to_value(serde_json::from_str(&encoded).unwrap());
    assert_eq!(decoded, value);
}

#[test]
fn test_null_decodes_to_integer_zero() {
    let decoded = json_to_value(serde_json::from_str("null").unwrap());
    assert_eq!(decoded, Value::Integer(0));
    // The absent value still encodes as JSON null
    assert_eq!(to_json_string(&Value::Null), "null");
}
