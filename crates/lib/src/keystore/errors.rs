//! Error types for the keystore.

use thiserror::Error;

/// Structured error types for keystore operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// The persisted format tag differs from the currently supported one.
    #[error("keystore format doesn't match expected version: '{expected}' got '{found}'")]
    VersionMismatch { expected: String, found: String },

    /// The file carries the right format tag but its contents cannot be
    /// decoded.
    #[error("keystore file is corrupt: {reason}")]
    Corrupt { reason: String },

    /// No secret is stored under the requested name.
    #[error("no secret named {name:?} in the keystore")]
    SecretNotFound { name: String },

    #[error("encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error("decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    #[error("invalid salt length: expected {expected}, got {actual}")]
    InvalidSaltLength { expected: usize, actual: usize },

    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    /// The store does not expose the listing capability.
    #[error("keystore does not support listing")]
    ListingUnsupported,

    #[error("keystore file I/O failed")]
    FileIo {
        #[source]
        source: std::io::Error,
    },

    #[error("keystore serialization failed")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },
}

impl KeystoreError {
    /// Check if this error indicates a missing secret.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KeystoreError::SecretNotFound { .. })
    }

    /// Check if this error indicates an unreadable or mismatched on-disk
    /// format.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            KeystoreError::VersionMismatch { .. } | KeystoreError::Corrupt { .. }
        )
    }

    /// Check if this error is crypto-related.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            KeystoreError::EncryptionFailed { .. }
                | KeystoreError::DecryptionFailed { .. }
                | KeystoreError::InvalidSaltLength { .. }
                | KeystoreError::InvalidNonceLength { .. }
        )
    }
}

// Conversion from KeystoreError to the main Error type
impl From<KeystoreError> for crate::Error {
    fn from(err: KeystoreError) -> Self {
        crate::Error::Keystore(err)
    }
}
