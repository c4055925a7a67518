// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use topdown::*;

#[test]
fn non_string_key() -> Result<()> {
    let mut obj = Value::new_object();

    obj.as_object_mut()?.insert(Value::Null, Value::Null);
    obj.as_object_mut()?.insert(Value::Bool(false), Value::Null);
    obj.as_object_mut()?.insert(Value::from(3u64), Value::Null);
    obj.as_object_mut()?.insert(
        Value::from(vec![Value::Bool(true), Value::Null]),
        Value::Null,
    );
    obj.as_object_mut()?.insert(Value::from("s"), Value::Null);

    let json = serde_json::to_string_pretty(&obj)?;
    let expected = r#"{
  "null": null,
  "false": null,
  "3": null,
  "s": null,
  "[true,null]": null
}"#;

    assert_eq!(json, expected);
    Ok(())
}

#[test]
fn serialize_number() -> Result<()> {
    // Integers are written without a fractional part.
    assert_eq!(serde_json::to_string(&Value::from(7u64))?, "7");
    assert_eq!(serde_json::to_string(&Value::from(-7i64))?, "-7");

    // Numbers read from text keep their spelling.
    let v = Value::from_json_str(r#"[3.0, 66.66667]"#)?;
    assert_eq!(serde_json::to_string(&v)?, "[3.0,66.66667]");
    Ok(())
}

#[test]
fn serialize_string() -> Result<()> {
    assert_eq!(
        Value::String("Hello, World\n".into()).to_json_str()?,
        "\"Hello, World\\n\""
    );
    Ok(())
}

#[test]
fn constructors() -> Result<()> {
    assert_eq!(Value::new_object(), Value::from_json_str("{}")?);
    assert_eq!(Value::new_array(), Value::from_json_str("[]")?);
    assert_eq!(Value::from(f64::NAN), Value::Null);
    Ok(())
}

#[test]
fn cross_kind_order() -> Result<()> {
    let mut values = vec![
        Value::from_json_str(r#"{"a": 1}"#)?,
        Value::from_json_str("[1]")?,
        Value::from("a"),
        Value::from(1u64),
        Value::Bool(true),
        Value::Bool(false),
        Value::Null,
    ];
    values.sort();
    let sorted = Value::from(values);
    assert_eq!(
        sorted,
        Value::from_json_str(r#"[null, false, true, 1, "a", [1], {"a": 1}]"#)?
    );
    Ok(())
}

#[test]
fn within_kind_order() -> Result<()> {
    let v = |s: &str| Value::from_json_str(s);
    assert!(v("[1, 2]")? < v("[1, 3]")?);
    assert!(v("[1, 2]")? < v("[1, 2, 0]")?);
    assert!(v(r#"{"a": 1}"#)? < v(r#"{"a": 2}"#)?);
    assert!(v(r#"{"a": 1}"#)? < v(r#"{"b": 0}"#)?);
    assert!(v(r#""abc""#)? < v(r#""abd""#)?);
    assert!(v("-1.5")? < v("-1")?);
    Ok(())
}

#[test]
fn indexing() -> Result<()> {
    let v = Value::from_json_str(r#"{"a": [10, 20], "b": {"c": true}}"#)?;

    assert_eq!(v["a"][1], Value::from(20u64));
    assert_eq!(v["a"][2], Value::Undefined);
    assert_eq!(v["b"]["c"], Value::Bool(true));
    assert_eq!(v["missing"]["c"], Value::Undefined);
    assert_eq!(v["a"][&Value::from(0u64)], Value::from(10u64));
    assert_eq!(v["a"][&Value::from_json_str("0.5")?], Value::Undefined);
    assert_eq!(v["a"][&Value::from("0")], Value::Undefined);
    Ok(())
}

#[test]
fn entries() -> Result<()> {
    let v = Value::from_json_str(r#"{"b": 2, "a": 1}"#)?;
    let keys: Vec<Value> = v.entries().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);

    let v = Value::from_json_str(r#"["x", "y"]"#)?;
    let entries = v.entries();
    assert_eq!(entries[1], (Value::from(1u64), Value::from("y")));

    assert!(Value::from(1u64).entries().is_empty());
    Ok(())
}

#[test]
fn merge() -> Result<()> {
    let mut v = Value::from_json_str(r#"{"a": {"x": 1}}"#)?;
    v.merge(Value::from_json_str(r#"{"a": {"y": 2}, "b": 3}"#)?)?;
    assert_eq!(
        v,
        Value::from_json_str(r#"{"a": {"x": 1, "y": 2}, "b": 3}"#)?
    );

    // Same value twice is fine, a different one is not.
    v.merge(Value::from_json_str(r#"{"b": 3}"#)?)?;
    assert!(v.merge(Value::from_json_str(r#"{"b": 4}"#)?).is_err());
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn yaml() -> Result<()> {
    use std::collections::BTreeMap;

    let v = Value::from_yaml_str("a: [1, 2.5, true, ~]\nb: text\n")?;
    let mut expected = BTreeMap::new();
    expected.insert(
        Value::from("a"),
        Value::from_json_str("[1, 2.5, true, null]")?,
    );
    expected.insert(Value::from("b"), Value::from("text"));
    assert_eq!(v, Value::from(expected));
    Ok(())
}

#[test]
fn json_file() -> Result<()> {
    let v = Value::from_json_file("tests/value/data/users.json")?;
    assert_eq!(v["users"][0]["name"], Value::from("alice"));
    assert_eq!(v["users"][1]["groups"][0], Value::from("dev"));
    // Spelling survives the file round trip.
    assert_eq!(v["users"][0]["quota"].to_string(), "2.50");

    let err = Value::from_json_file("tests/value/data/missing.json").unwrap_err();
    assert!(err.to_string().starts_with("Failed to read"), "{err}");
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_file() -> Result<()> {
    let from_yaml = Value::from_yaml_file("tests/value/data/users.yaml")?;
    let from_json = Value::from_json_file("tests/value/data/users.json")?;
    assert_eq!(from_yaml, from_json);
    Ok(())
}
