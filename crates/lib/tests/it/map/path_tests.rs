//! Tests for dotted-path resolution: get/put/delete/has_key and the
//! literal-key fast path.

use fieldvault::map::{Map, MapError, Value};
use serde_json::json;

use super::map_from;

#[test]
fn test_put_creates_missing_levels() {
    let mut m = Map::new();

    assert_eq!(m.put("a.b.c", 1).unwrap(), None);

    assert_eq!(m.get_value("a.b.c").unwrap(), &Value::Int(1));
    assert!(m.get_value("a.b").unwrap().is_map());
    assert!(m.get("a").unwrap().is_map());
}

#[test]
fn test_put_returns_previous_value() {
    let mut m = Map::new();

    assert_eq!(m.put("a.b", "original").unwrap(), None);
    let old = m.put("a.b", "modified").unwrap();

    assert_eq!(old.as_ref().and_then(|v| v.as_str()), Some("original"));
    assert_eq!(m.get_value("a.b").unwrap(), "modified");
}

#[test]
fn test_put_through_scalar_fails() {
    let mut m = Map::new();
    m.put("a", 5).unwrap();

    let err = m.put("a.b", 1).unwrap_err();
    assert!(matches!(err, MapError::NotMapType { kind: "int", .. }));
}

#[test]
fn test_get_value_missing_key() {
    let m = map_from(json!({"a": {"b": 1}}));

    // missing final key
    assert!(matches!(
        m.get_value("a.missing"),
        Err(MapError::KeyNotFound { .. })
    ));
    // missing intermediate level
    assert!(matches!(
        m.get_value("missing.b"),
        Err(MapError::KeyNotFound { .. })
    ));
}

#[test]
fn test_get_value_through_scalar_fails() {
    let m = map_from(json!({"a": {"b": 1}}));

    assert!(matches!(
        m.get_value("a.b.c"),
        Err(MapError::NotMapType { .. })
    ));
}

#[test]
fn test_fast_path_literal_dotted_key() {
    let mut m = Map::new();
    m.insert("a.b", 1);

    // the literal key is matched before any dot-splitting
    assert_eq!(m.get_value("a.b").unwrap(), &Value::Int(1));
    assert_eq!(m.put("a.b", 2).unwrap(), Some(Value::Int(1)));

    // the value still lives under the literal key, no levels were created
    assert_eq!(m.get("a.b").unwrap(), &Value::Int(2));
    assert!(m.get("a").is_none());
}

#[test]
fn test_literal_key_shadows_nested_path() {
    let mut m = map_from(json!({"a": {"b": "nested"}}));
    m.insert("a.b", "literal");

    assert_eq!(m.get_value("a.b").unwrap(), "literal");

    // deleting the literal key reveals the nested path again
    m.delete("a.b").unwrap();
    assert_eq!(m.get_value("a.b").unwrap(), "nested");
}

#[test]
fn test_put_cannot_insert_literal_dotted_key() {
    let mut m = Map::new();
    m.put("x.y", 1).unwrap();

    // put always descends; only `insert` can create a literal dotted key
    assert!(m.get("x.y").is_none());
    assert!(m.get("x").unwrap().is_map());
}

#[test]
fn test_delete_removes_only_final_key() {
    let mut m = map_from(json!({"a": {"b": {"c": 1}, "keep": 2}}));

    assert_eq!(m.delete("a.b.c").unwrap(), Value::Int(1));

    assert!(!m.has_key("a.b.c").unwrap());
    assert!(m.get_value("a.b").unwrap().is_map());
    assert_eq!(m.get_value("a.keep").unwrap(), &Value::Int(2));
}

#[test]
fn test_delete_missing_key() {
    let mut m = map_from(json!({"a": {"b": 1}}));

    assert!(matches!(
        m.delete("a.missing"),
        Err(MapError::KeyNotFound { .. })
    ));
    assert!(matches!(
        m.delete("missing.b"),
        Err(MapError::KeyNotFound { .. })
    ));
}

#[test]
fn test_has_key_propagates_traversal_errors() {
    let m = map_from(json!({"a": {"b": 1}}));

    assert!(m.has_key("a.b").unwrap());
    assert!(!m.has_key("a.x").unwrap());

    // missing intermediate level is an error, not `false`
    assert!(matches!(
        m.has_key("nope.b"),
        Err(MapError::KeyNotFound { .. })
    ));
    // descending through a scalar is an error as well
    assert!(matches!(
        m.has_key("a.b.c"),
        Err(MapError::NotMapType { .. })
    ));
}

#[test]
fn test_clone_is_independent() {
    let original = map_from(json!({"user": {"name": "alice"}}));
    let mut copy = original.clone();

    copy.put("user.name", "bob").unwrap();
    copy.put("user.extra", 1).unwrap();

    assert_eq!(original.get_value("user.name").unwrap(), "alice");
    assert!(matches!(
        original.get_value("user.extra"),
        Err(MapError::KeyNotFound { .. })
    ));
}

#[test]
fn test_copy_fields_to() {
    let src = map_from(json!({"a": {"b": 1}, "c": 2}));
    let mut dst = Map::new();

    src.copy_fields_to(&mut dst, "a.b").unwrap();
    assert_eq!(dst.get_value("a.b").unwrap(), &Value::Int(1));

    assert!(matches!(
        src.copy_fields_to(&mut dst, "missing"),
        Err(MapError::KeyNotFound { .. })
    ));
}

#[test]
fn test_builder_and_direct_accessors() {
    let m = Map::new().with("name", "alice").with("age", 30);

    assert_eq!(m.len(), 2);
    assert!(m.contains_key("name"));
    assert_eq!(m.get("age").unwrap(), &Value::Int(30));
    assert!(m.get("missing").is_none());
}
