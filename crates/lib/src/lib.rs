//!
//! Fieldvault: path-addressed field maps and an encrypted secret keystore
//! for event pipelines.
//!
//! ## Core Concepts
//!
//! * **Maps (`map::Map`)**: A string-keyed tree of values representing
//!   semi-structured event and configuration data, addressed with dotted
//!   paths (e.g. `"user.profile.name"`). Literal keys containing dots are
//!   matched ahead of dot-splitting, so data inserted with verbatim dotted
//!   keys stays addressable.
//! * **Traversal (`map::TraversalMode`)**: A generalized walk over a dotted
//!   path with case-sensitive or case-insensitive segment matching,
//!   collision detection, and mutation through a visitor. Key recovery
//!   (`Map::find_fold`) and path renaming (`Map::alter_path`) are built on
//!   it.
//! * **Log emission (`map::MaskedEmitter`)**: Maps emit themselves to a
//!   generic structured-log encoder in sorted key order, after an injected
//!   masking transform has redacted a cloned copy.
//! * **Keystore (`keystore::FileKeystore`)**: A password-protected secret
//!   store persisted in a versioned file format; stores written by another
//!   format generation are rejected with an explicit version error.

pub mod keystore;
pub mod map;

/// Re-export the `Map` and `Value` types for easier access.
pub use map::{Map, Value};

/// Result type used throughout the Fieldvault library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Fieldvault library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured map errors from the map module
    #[error(transparent)]
    Map(map::MapError),

    /// Structured keystore errors from the keystore module
    #[error(transparent)]
    Keystore(keystore::KeystoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Map(_) => "map",
            Error::Keystore(_) => "keystore",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Map(map_err) => map_err.is_not_found(),
            Error::Keystore(keystore_err) => keystore_err.is_not_found(),
        }
    }

    /// Check if this error indicates a key collision.
    pub fn is_collision(&self) -> bool {
        match self {
            Error::Map(map_err) => map_err.is_collision(),
            _ => false,
        }
    }

    /// Check if this error is shape- or type-related.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Map(map_err) => map_err.is_type_error(),
            _ => false,
        }
    }
}
