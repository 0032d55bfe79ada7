//! Path-addressed nested field maps.
//!
//! This module provides [`Map`], a string-keyed tree of [`Value`]s used to
//! represent semi-structured event and configuration data, together with the
//! dotted-path engine that addresses locations inside it.
//!
//! # Path Resolution
//!
//! Keys can be expressed in dot-notation (e.g. `"user.name"`) to address
//! nested levels. Resolution follows two interacting conventions:
//!
//! 1. A literal key containing dots (inserted via [`Map::insert`]) is matched
//!    first at the current level before any dot-splitting is attempted (the
//!    "fast path").
//! 2. Otherwise each level is descended by splitting the remaining path at
//!    the first dot.
//!
//! # Usage
//!
//! ```
//! use fieldvault::map::Map;
//!
//! let mut event = Map::new();
//! event.put("user.name", "alice")?;
//! event.put("user.logins", 3)?;
//!
//! assert_eq!(event.get_value("user.name")?.as_str(), Some("alice"));
//! assert!(event.has_key("user.logins")?);
//! # Ok::<(), fieldvault::map::MapError>(())
//! ```

use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
};

// Submodules
pub mod errors;
pub mod log;
pub mod traverse;
pub mod value;

pub use errors::MapError;
pub use log::{JsonObjectEncoder, MaskFn, MaskedEmitter, ObjectEncoder};
pub use traverse::TraversalMode;
pub use value::Value;

/// Key under which event fields are nested when they are not merged at the
/// root of the event.
pub const FIELDS_KEY: &str = "fields";

/// Key holding the tag sequence of an event.
pub const TAGS_KEY: &str = "tags";

/// A string-keyed tree of [`Value`]s with dotted-path access.
///
/// All operations mutate in place; there is no copy-on-write. `Map` is not
/// synchronized — callers sharing one instance across threads must serialize
/// access externally.
///
/// Key iteration order is not guaranteed; operations that need determinism
/// (such as structured-log emission) sort keys explicitly.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Map {
    entries: HashMap<String, Value>,
}

/// The slot a dotted path resolves to: the final-level map, the final
/// un-dotted key, and whether a value is already present under it.
struct PathSlot<'m> {
    level: &'m mut Map,
    key: String,
    present: bool,
}

impl Map {
    /// Creates a new empty map
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Creates a new empty map with at least the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Returns true if the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of direct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts a value directly under `key` at this level, returning the
    /// previous value if present.
    ///
    /// No dot-splitting is performed: this is the only way to create a
    /// literal key containing dots. Path functions match such keys via the
    /// fast path but can never insert them.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Gets a value directly under `key` at this level (no dot-splitting)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Gets a mutable reference to the value directly under `key`
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Removes the value directly under `key`, returning it if present
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Returns true if `key` exists directly at this level
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns an iterator over all key-value pairs at this level
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Returns an iterator over all keys at this level
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Returns an iterator over all values at this level
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Resolves a dotted path immutably.
    ///
    /// Returns `Ok(Some(value))` when the full path resolves, `Ok(None)` when
    /// only the final key is absent, `Err(KeyNotFound)` when an intermediate
    /// segment is missing, and `Err(NotMapType)` when a mid-path value cannot
    /// be descended into. The fast path (literal key match before
    /// dot-splitting) applies at every level.
    fn resolve<'m>(&'m self, path: &str) -> Result<Option<&'m Value>, MapError> {
        let mut data = self;
        let mut key = path;

        loop {
            // Fast path, key is present as is.
            if let Some(v) = data.entries.get(key) {
                return Ok(Some(v));
            }

            let Some(idx) = key.find('.') else {
                return Ok(None);
            };
            let (head, tail) = (&key[..idx], &key[idx + 1..]);

            data = match data.entries.get(head) {
                Some(Value::Map(m)) => m,
                Some(other) => {
                    return Err(MapError::NotMapType {
                        path: path.to_string(),
                        kind: other.type_name(),
                    });
                }
                None => {
                    return Err(MapError::KeyNotFound {
                        path: path.to_string(),
                    });
                }
            };
            key = tail;
        }
    }

    /// Resolves a dotted path mutably, finding the final-level map and the
    /// final un-dotted key to operate on.
    ///
    /// With `create_missing`, absent intermediate levels are inserted as
    /// empty maps; an existing non-map intermediate still fails with
    /// `NotMapType`.
    fn find_mut<'m>(
        &'m mut self,
        path: &str,
        create_missing: bool,
    ) -> Result<PathSlot<'m>, MapError> {
        let mut data = self;
        let mut key = path;

        loop {
            // Fast path, key is present as is.
            if data.entries.contains_key(key) {
                return Ok(PathSlot {
                    level: data,
                    key: key.to_string(),
                    present: true,
                });
            }

            let Some(idx) = key.find('.') else {
                return Ok(PathSlot {
                    level: data,
                    key: key.to_string(),
                    present: false,
                });
            };
            let (head, tail) = (&key[..idx], &key[idx + 1..]);

            data = match data.entries.entry(head.to_string()) {
                Entry::Occupied(slot) => match slot.into_mut() {
                    Value::Map(m) => m,
                    other => {
                        return Err(MapError::NotMapType {
                            path: path.to_string(),
                            kind: other.type_name(),
                        });
                    }
                },
                Entry::Vacant(slot) => {
                    if !create_missing {
                        return Err(MapError::KeyNotFound {
                            path: path.to_string(),
                        });
                    }
                    match slot.insert(Value::Map(Map::new())) {
                        Value::Map(m) => m,
                        _ => unreachable!(),
                    }
                }
            };
            key = tail;
        }
    }

    /// Gets the value at a dotted path. Fails with `KeyNotFound` if the path
    /// does not resolve.
    pub fn get_value(&self, path: &str) -> Result<&Value, MapError> {
        match self.resolve(path)? {
            Some(v) => Ok(v),
            None => Err(MapError::KeyNotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Associates `value` with the dotted path, creating intermediate levels
    /// as needed, and returns the previous value if one was present.
    ///
    /// Keys containing literal dots cannot be inserted this way; use
    /// [`Map::insert`] for those.
    ///
    /// ```
    /// use fieldvault::map::Map;
    ///
    /// let mut m = Map::new();
    /// assert_eq!(m.put("a.b", 1)?, None);
    /// assert_eq!(m.put("a.b", 2)?, Some(1.into()));
    /// # Ok::<(), fieldvault::map::MapError>(())
    /// ```
    pub fn put(&mut self, path: &str, value: impl Into<Value>) -> Result<Option<Value>, MapError> {
        let slot = self.find_mut(path, true)?;
        Ok(slot.level.entries.insert(slot.key, value.into()))
    }

    /// Removes the value at a dotted path, returning it. Fails with
    /// `KeyNotFound` if the path does not resolve.
    pub fn delete(&mut self, path: &str) -> Result<Value, MapError> {
        let slot = self.find_mut(path, false)?;
        if !slot.present {
            return Err(MapError::KeyNotFound {
                path: path.to_string(),
            });
        }
        match slot.level.entries.remove(&slot.key) {
            Some(v) => Ok(v),
            None => Err(MapError::KeyNotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Returns true if the dotted path resolves to a value. Traversal errors
    /// (missing intermediate levels, non-map mid-path values) are propagated.
    pub fn has_key(&self, path: &str) -> Result<bool, MapError> {
        Ok(self.resolve(path)?.is_some())
    }

    /// Copies the value at `path` into `to` under the same path. Fails if
    /// the path does not resolve in the source map.
    pub fn copy_fields_to(&self, to: &mut Map, path: &str) -> Result<(), MapError> {
        let v = self.get_value(path)?.clone();
        to.put(path, v)?;
        Ok(())
    }

    /// Copies all top-level pairs from `other` into this map, overwriting
    /// existing keys. Nested maps are not merged.
    pub fn update(&mut self, other: &Map) {
        for (k, v) in other.iter() {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Recursively copies the pairs from `other` into this map. Where both
    /// sides hold a map under the same key the sub-maps are merged; any other
    /// existing value is overwritten.
    ///
    /// [`Map::deep_update_no_overwrite`] is a version of this function that
    /// does not overwrite existing values.
    pub fn deep_update(&mut self, other: &Map) {
        self.deep_merge(other, true);
    }

    /// Recursively copies the pairs from `other` into this map, keeping
    /// every existing value in place. Only absent keys are filled; sub-maps
    /// present on both sides are still merged recursively.
    pub fn deep_update_no_overwrite(&mut self, other: &Map) {
        self.deep_merge(other, false);
    }

    fn deep_merge(&mut self, other: &Map, overwrite: bool) {
        for (k, v) in other.iter() {
            match self.entries.entry(k.clone()) {
                Entry::Occupied(mut slot) => match (slot.get_mut(), v) {
                    (Value::Map(dst), Value::Map(src)) => dst.deep_merge(src, overwrite),
                    (dst, _) => {
                        if overwrite {
                            *dst = v.clone();
                        }
                    }
                },
                Entry::Vacant(slot) => {
                    slot.insert(v.clone());
                }
            }
        }
    }

    /// Merges the top-level pairs of `from` into this map (no deep merge).
    /// With `under_root` the destination is the map itself, otherwise the
    /// nested map under [`FIELDS_KEY`], created as needed. Fails with
    /// `TypeMismatch` if an existing `fields` value is not map-shaped.
    pub fn merge_fields(&mut self, from: &Map, under_root: bool) -> Result<(), MapError> {
        if from.is_empty() {
            return Ok(());
        }
        let dest = self.fields_destination(from.len(), under_root)?;
        for (k, v) in from.iter() {
            dest.entries.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    /// Recursively merges `from` into this map following the same
    /// destination rule as [`Map::merge_fields`], using [`Map::deep_update`]
    /// instead of a shallow overwrite.
    pub fn merge_fields_deep(&mut self, from: &Map, under_root: bool) -> Result<(), MapError> {
        if from.is_empty() {
            return Ok(());
        }
        let dest = self.fields_destination(from.len(), under_root)?;
        dest.deep_update(from);
        Ok(())
    }

    fn fields_destination(
        &mut self,
        capacity: usize,
        under_root: bool,
    ) -> Result<&mut Map, MapError> {
        if under_root {
            return Ok(self);
        }
        match self.entries.entry(FIELDS_KEY.to_string()) {
            Entry::Occupied(slot) => match slot.into_mut() {
                Value::Map(m) => Ok(m),
                other => Err(MapError::TypeMismatch {
                    key: FIELDS_KEY.to_string(),
                    expected: "map",
                    kind: other.type_name(),
                }),
            },
            Entry::Vacant(slot) => match slot.insert(Value::Map(Map::with_capacity(capacity))) {
                Value::Map(m) => Ok(m),
                _ => unreachable!(),
            },
        }
    }

    /// Appends `tags` to the sequence under [`TAGS_KEY`], creating it if
    /// absent. See [`Map::add_tags_with_key`].
    pub fn add_tags<I, S>(&mut self, tags: I) -> Result<(), MapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_tags_with_key(TAGS_KEY, tags)
    }

    /// Appends `tags` to the sequence at the dotted path `key`, creating it
    /// if absent. Fails with `TypeMismatch` if an existing value at `key` is
    /// not a sequence. The list is not deduplicated.
    pub fn add_tags_with_key<I, S>(&mut self, key: &str, tags: I) -> Result<(), MapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<Value> = tags.into_iter().map(|t| Value::Str(t.into())).collect();
        if tags.is_empty() {
            return Ok(());
        }

        let slot = self.find_mut(key, true)?;
        if !slot.present {
            slot.level.entries.insert(slot.key, Value::Array(tags));
            return Ok(());
        }

        match slot.level.entries.get_mut(&slot.key) {
            Some(Value::Array(existing)) => {
                existing.extend(tags);
                Ok(())
            }
            Some(other) => Err(MapError::TypeMismatch {
                key: slot.key.clone(),
                expected: "string array",
                kind: other.type_name(),
            }),
            None => Err(MapError::KeyNotFound {
                path: key.to_string(),
            }),
        }
    }

    /// Produces a new single-level map where every leaf of this map is
    /// addressed by its full dotted path from the root. Nested maps are
    /// recursed into and not themselves included as values.
    ///
    /// ```
    /// use fieldvault::map::Map;
    ///
    /// let mut m = Map::new();
    /// m.put("hello.world", "test")?;
    ///
    /// let flat = m.flatten();
    /// assert_eq!(flat.get("hello.world").unwrap().as_str(), Some("test"));
    /// assert_eq!(flat.len(), 1);
    /// # Ok::<(), fieldvault::map::MapError>(())
    /// ```
    pub fn flatten(&self) -> Map {
        let mut out = Map::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Map) {
        for (k, v) in self.iter() {
            let full_key = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            match v {
                Value::Map(m) => m.flatten_into(&full_key, out),
                _ => {
                    out.entries.insert(full_key, v.clone());
                }
            }
        }
    }

    /// Produces the sequence of every dotted path reachable in the map.
    /// Unlike [`Map::flatten`] this includes the paths of intermediate map
    /// nodes themselves; a nested node's children appear before the node.
    pub fn flatten_keys(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_keys_into("", &mut out);
        out
    }

    fn flatten_keys_into(&self, prefix: &str, out: &mut Vec<String>) {
        for (k, v) in self.iter() {
            let full_key = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            if let Value::Map(m) = v {
                m.flatten_keys_into(&full_key, out);
            }
            out.push(full_key);
        }
    }

    /// Creates a new map containing the union of the top-level pairs of the
    /// two maps. Pairs from `b` overwrite pairs from `a`.
    pub fn union(a: &Map, b: &Map) -> Map {
        let mut out = a.clone();
        out.update(b);
        out
    }

    /// Returns the map as two-space-indented JSON, or a diagnostic string if
    /// the map cannot be encoded.
    pub fn to_pretty_json(&self) -> String {
        match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(err) => format!("Not valid json: {err}"),
        }
    }
}

impl fmt::Display for Map {
    /// Formats the map as compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(err) => write!(f, "Not valid json: {err}"),
        }
    }
}

impl From<HashMap<String, Value>> for Map {
    fn from(entries: HashMap<String, Value>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// Builder pattern methods
impl Map {
    /// Builder method to insert a direct key-value pair and return self
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }
}

/// Fields and tags that can be added to an event via configuration.
///
/// `fields_under_root` selects whether [`EventMetadata::fields`] are merged
/// at the root of the event or nested under [`FIELDS_KEY`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub fields: Map,
    #[serde(default)]
    pub fields_under_root: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EventMetadata {
    /// Merges the configured fields and tags into `event`.
    pub fn apply_to(&self, event: &mut Map) -> Result<(), MapError> {
        event.merge_fields(&self.fields, self.fields_under_root)?;
        event.add_tags(self.tags.iter().cloned())
    }
}
