//! Tests for the path-addressed map engine.

mod path_tests;
mod tags_tests;

use fieldvault::Map;

/// Builds a [`Map`] from a literal JSON object.
pub fn map_from(value: serde_json::Value) -> Map {
    serde_json::from_value(value).expect("valid map literal")
}
