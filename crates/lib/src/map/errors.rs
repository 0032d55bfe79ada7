//! Error types for map operations.
//!
//! This module defines structured error types for path resolution, traversal
//! and merge failures on [`Map`](super::Map). Every error carries the path or
//! key it refers to so callers can report failures without extra bookkeeping.

use thiserror::Error;

/// Structured error types for map operations.
///
/// Path and traversal operations surface these as ordinary result values;
/// nothing is retried or logged internally.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MapError {
    /// A requested path segment, or literal key, does not exist at the
    /// expected level.
    #[error("key not found in path {path:?}")]
    KeyNotFound { path: String },

    /// Case-insensitive matching found more than one key at a level, or a
    /// rename target already exists at that level.
    #[error("multiple keys match {key:?} on the same level of path {path:?}")]
    KeyCollision { key: String, path: String },

    /// A value encountered mid-path must be a map to continue the descent
    /// but is not.
    #[error("cannot traverse past path {path:?}: value is not a map (found {kind})")]
    NotMapType { path: String, kind: &'static str },

    /// A key rename produced an empty replacement name.
    #[error("replacement key for {key:?} cannot be empty")]
    EmptyReplacementKey { key: String },

    /// An existing value's shape is incompatible with the requested merge or
    /// tag operation.
    #[error("expected {expected} at key {key:?} but found {kind}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        kind: &'static str,
    },
}

impl MapError {
    /// Check if this error indicates a missing key or path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MapError::KeyNotFound { .. })
    }

    /// Check if this error indicates a key collision.
    pub fn is_collision(&self) -> bool {
        matches!(self, MapError::KeyCollision { .. })
    }

    /// Check if this error is shape-related (non-map mid-path values and
    /// merge/tag type mismatches).
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            MapError::NotMapType { .. } | MapError::TypeMismatch { .. }
        )
    }

    /// Get the path if this is a path-related error.
    pub fn path(&self) -> Option<&str> {
        match self {
            MapError::KeyNotFound { path }
            | MapError::KeyCollision { path, .. }
            | MapError::NotMapType { path, .. } => Some(path),
            _ => None,
        }
    }
}

// Conversion from MapError to the main Error type
impl From<MapError> for crate::Error {
    fn from(err: MapError) -> Self {
        crate::Error::Map(err)
    }
}
