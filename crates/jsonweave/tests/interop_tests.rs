//! Conversions between jsonweave and serde_json values

use jsonweave::*;
use pretty_assertions::assert_eq;

#[test]
fn test_serde_value_converts_in_order() {
    let source = serde_json::json!({"z": [1, 2.5, -0.0], "a": {"nested": null}, "m": "~N:qty"});
    let value = Value::from(&source);
    assert_eq!(
        value.to_string(),
        serde_json::to_string(&source).unwrap(),
    );
    assert!(path::get(&value, &["m"]).unwrap().is_placeholder());
}

#[test]
fn test_converted_template_applies() {
    let mut engine = Engine::new();
    let doc = Value::from(serde_json::json!({"user": "~S:name", "age": "~N:age"}));
    let out = engine
        .template(&doc, &Bindings::new().with("name", "ada").with("age", 36))
        .unwrap();
    assert_eq!(
        serde_json::Value::from(&out),
        serde_json::json!({"user": "ada", "age": 36})
    );
}

#[test]
fn test_round_trip_through_serde() {
    let value = parse(r#"{"b":[true,null,"~L:x"],"a":1.50,"big":12345678901234567890}"#).unwrap();
    let there = serde_json::Value::from(&value);
    assert_eq!(there["b"][2], serde_json::json!("~L:x"));
    let back = Value::from(there);
    assert_eq!(path::get(&back, &["b"]).unwrap(), path::get(&value, &["b"]).unwrap());
    assert_eq!(path::get(&back, &["big"]).unwrap().to_string(), "12345678901234567890");
    // serde_json keeps the value, not the spelling
    assert_eq!(path::get(&back, &["a"]).unwrap().to_string(), "1.5");
}
