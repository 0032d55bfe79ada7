//! Generalized path traversal with case-sensitive and case-insensitive
//! segment matching.
//!
//! [`Map::traverse`] walks every segment of a dotted path and invokes a
//! visitor at each matched level. The visitor receives a mutable borrow of
//! the level and may change it, including renaming or deleting the matched
//! key; the descent step re-reads the value under the (possibly renamed) key
//! after the visitor returns, never caching it beforehand.
//!
//! [`Map::find_fold`] and [`Map::alter_path`] are built on the same segment
//! matching rules.

use super::{Map, MapError, Value};

/// How a path segment is matched against the keys of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// The key match is strictly case-sensitive
    CaseSensitive,
    /// The key match ignores character case
    CaseInsensitive,
}

fn fold_eq(a: &str, b: &str) -> bool {
    if a.eq_ignore_ascii_case(b) {
        return true;
    }
    a.to_lowercase() == b.to_lowercase()
}

/// Finds the key of `level` matching `segment` under `mode`.
///
/// Case-insensitive matching scans every key at the level so collisions can
/// be detected: more than one match fails with `KeyCollision`, zero matches
/// fail with `KeyNotFound`.
fn match_key(
    level: &Map,
    segment: &str,
    mode: TraversalMode,
    path: &str,
) -> Result<String, MapError> {
    match mode {
        TraversalMode::CaseSensitive => {
            if level.entries.contains_key(segment) {
                Ok(segment.to_string())
            } else {
                Err(MapError::KeyNotFound {
                    path: path.to_string(),
                })
            }
        }
        TraversalMode::CaseInsensitive => {
            let mut matched: Option<&String> = None;
            for key in level.entries.keys() {
                if !fold_eq(key, segment) {
                    continue;
                }
                if matched.is_some() {
                    return Err(MapError::KeyCollision {
                        key: key.clone(),
                        path: path.to_string(),
                    });
                }
                matched = Some(key);
            }
            match matched {
                Some(key) => Ok(key.clone()),
                None => Err(MapError::KeyNotFound {
                    path: path.to_string(),
                }),
            }
        }
    }
}

impl Map {
    /// Walks the dotted `path` and invokes `visitor` on each level, passing
    /// the current-level map and the matched key.
    ///
    /// The visitor is allowed to make changes in the level or collect data.
    /// If it renames the matched key it must return `Ok(Some(new_key))` so
    /// the descent can follow the renamed entry; `Ok(None)` means the key is
    /// unchanged.
    ///
    /// Fails with `KeyCollision` if multiple keys match the same segment
    /// (case-insensitive mode), `NotMapType` when a non-terminal value
    /// cannot be descended into, and `KeyNotFound` when the path does not
    /// exist or the visitor removed a non-terminal key.
    pub fn traverse<F>(
        &mut self,
        path: &str,
        mode: TraversalMode,
        mut visitor: F,
    ) -> Result<(), MapError>
    where
        F: FnMut(&mut Map, &str) -> Result<Option<String>, MapError>,
    {
        let segments: Vec<&str> = path.split('.').collect();
        let last = segments.len() - 1;
        let mut current = self;

        for (i, segment) in segments.iter().enumerate() {
            let matched = match_key(current, segment, mode, path)?;
            let renamed = visitor(current, &matched)?;
            if i == last {
                continue;
            }

            // Re-resolve under the effective key: the visitor may have
            // renamed the entry or replaced its value.
            let effective = renamed.unwrap_or(matched);
            current = match current.entries.get_mut(&effective) {
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
        }

        Ok(())
    }

    /// Traverses `path` matching every segment case-insensitively and
    /// returns the actually-matched key (segments joined with dots) together
    /// with the resolved value.
    ///
    /// ```
    /// use fieldvault::map::Map;
    ///
    /// let mut m = Map::new();
    /// m.put("User.Name", "alice")?;
    ///
    /// let (matched, value) = m.find_fold("user.name")?;
    /// assert_eq!(matched, "User.Name");
    /// assert_eq!(value.as_str(), Some("alice"));
    /// # Ok::<(), fieldvault::map::MapError>(())
    /// ```
    ///
    /// Fails with `KeyCollision` if multiple keys match the same segment,
    /// `NotMapType` when a mid-path value is not a map, and `KeyNotFound`
    /// when the path does not exist.
    pub fn find_fold(&self, path: &str) -> Result<(String, &Value), MapError> {
        let segments: Vec<&str> = path.split('.').collect();
        let last = segments.len() - 1;
        let mut current = self;
        let mut matched_path = String::with_capacity(path.len());

        for (i, segment) in segments.iter().enumerate() {
            let key = match_key(current, segment, TraversalMode::CaseInsensitive, path)?;
            matched_path.push_str(&key);

            if i == last {
                return match current.entries.get(&key) {
                    Some(value) => Ok((matched_path, value)),
                    None => Err(MapError::KeyNotFound {
                        path: path.to_string(),
                    }),
                };
            }
            matched_path.push('.');

            current = match current.entries.get(&key) {
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
        }

        Err(MapError::KeyNotFound {
            path: path.to_string(),
        })
    }

    /// Walks `path` and renames each matched key to the value returned by
    /// `alter`.
    ///
    /// Returning the same name leaves the entry untouched. Fails with
    /// `EmptyReplacementKey` when `alter` produces an empty name and
    /// `KeyCollision` when the new name already exists at that level, plus
    /// the usual traversal errors of [`Map::traverse`].
    pub fn alter_path<F>(
        &mut self,
        path: &str,
        mode: TraversalMode,
        mut alter: F,
    ) -> Result<(), MapError>
    where
        F: FnMut(&str) -> Result<String, MapError>,
    {
        self.traverse(path, mode, |level, key| {
            let new_key = alter(key)?;
            if new_key.is_empty() {
                return Err(MapError::EmptyReplacementKey {
                    key: key.to_string(),
                });
            }
            // if the altered key equals the original, skip the delete/insert
            if new_key == key {
                return Ok(None);
            }
            if level.entries.contains_key(&new_key) {
                return Err(MapError::KeyCollision {
                    key: new_key,
                    path: path.to_string(),
                });
            }
            match level.entries.remove(key) {
                Some(value) => {
                    level.entries.insert(new_key.clone(), value);
                    Ok(Some(new_key))
                }
                None => Err(MapError::KeyNotFound {
                    path: path.to_string(),
                }),
            }
        })
    }
}
