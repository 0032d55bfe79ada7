//! Tests for tag management.

use fieldvault::map::{Map, MapError, TAGS_KEY, Value};
use serde_json::json;

use super::map_from;

fn tags_of(m: &Map, key: &str) -> Vec<String> {
    m.get_value(key)
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_add_tags_creates_tags_key() {
    let mut m = Map::new();
    m.add_tags(["t1", "t2"]).unwrap();

    assert_eq!(tags_of(&m, TAGS_KEY), ["t1", "t2"]);
}

#[test]
fn test_add_tags_appends_without_deduplication() {
    let mut m = Map::new();
    m.add_tags(["t1", "t2"]).unwrap();
    m.add_tags(["t2", "t3"]).unwrap();

    assert_eq!(tags_of(&m, TAGS_KEY), ["t1", "t2", "t2", "t3"]);
}

#[test]
fn test_add_tags_with_nested_key() {
    let mut m = Map::new();
    m.add_tags_with_key("labels.env", ["prod"]).unwrap();

    assert_eq!(tags_of(&m, "labels.env"), ["prod"]);
    assert!(m.get_value("labels").unwrap().is_map());
}

#[test]
fn test_add_tags_appends_to_existing_array() {
    let mut m = map_from(json!({"tags": ["existing"]}));
    m.add_tags(["new"]).unwrap();

    assert_eq!(tags_of(&m, TAGS_KEY), ["existing", "new"]);
}

#[test]
fn test_add_tags_rejects_non_array_value() {
    let mut m = map_from(json!({"tags": "not-an-array"}));

    let err = m.add_tags(["t1"]).unwrap_err();
    assert!(matches!(
        err,
        MapError::TypeMismatch { kind: "string", .. }
    ));
}

#[test]
fn test_add_tags_empty_input_is_noop() {
    let mut m = Map::new();
    m.add_tags(Vec::<String>::new()).unwrap();

    assert!(m.get(TAGS_KEY).is_none());
}

#[test]
fn test_add_tags_to_literal_dotted_key() {
    let mut m = Map::new();
    m.insert("labels.env", Value::Array(vec![Value::Str("a".into())]));

    // the fast path addresses the literal key, no levels are split off
    m.add_tags_with_key("labels.env", ["b"]).unwrap();
    assert_eq!(tags_of(&m, "labels.env"), ["a", "b"]);
    assert!(m.get("labels").is_none());
}
