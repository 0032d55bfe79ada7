//! Local encrypted secret store with a versioned on-disk format.
//!
//! A [`FileKeystore`] persists named secrets in a single text file. The file
//! begins with a two-byte format tag (currently [`KEYSTORE_VERSION`])
//! followed by the base64 encoding of `salt || nonce || ciphertext`, where
//! the ciphertext is an AES-256-GCM encryption of a JSON object mapping
//! secret names to base64 secret bytes. The encryption key is derived from
//! the keystore password with Argon2id.
//!
//! Opening a file whose format tag differs from the supported one fails
//! before any decoding is attempted, so stores written by a different
//! format generation are rejected with a precise version error rather than
//! a decryption failure.
//!
//! Listing is a capability upgrade: code holding a `&dyn Keystore` probes
//! for it with [`as_listing_keystore`].

use std::{
    collections::BTreeMap,
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
};

use base64ct::{Base64, Encoding};
use tracing::debug;
use zeroize::Zeroizing;

pub mod crypto;
pub mod errors;

pub use errors::KeystoreError;

use crypto::{NONCE_LENGTH, SALT_LENGTH};

/// The currently supported on-disk format tag.
pub const KEYSTORE_VERSION: &str = "v2";

/// A secret byte buffer that is zeroized on drop and redacted in debug
/// output.
#[derive(Clone)]
pub struct SecureBytes(Zeroizing<Vec<u8>>);

impl SecureBytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureBytes(<redacted>)")
    }
}

impl PartialEq for SecureBytes {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for SecureBytes {}

impl From<&str> for SecureBytes {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for SecureBytes {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

/// A store of named secrets.
pub trait Keystore {
    /// Returns the secret stored under `name`
    fn retrieve(&self, name: &str) -> Result<SecureBytes, KeystoreError>;

    /// Stores `value` under `name`, replacing any existing secret
    fn store(&mut self, name: &str, value: SecureBytes);

    /// Removes the secret stored under `name`
    fn delete(&mut self, name: &str) -> Result<(), KeystoreError>;

    /// Persists the current secrets
    fn save(&self) -> Result<(), KeystoreError>;

    /// Probes for the listing capability. Stores that cannot enumerate
    /// their secret names return `None`.
    fn as_listing(&self) -> Option<&dyn ListingKeystore> {
        None
    }
}

/// A keystore that can enumerate the names of its secrets.
pub trait ListingKeystore: Keystore {
    /// Returns the sorted names of all stored secrets
    fn list(&self) -> Result<Vec<String>, KeystoreError>;
}

/// Upgrades a [`Keystore`] to a [`ListingKeystore`], failing with
/// `ListingUnsupported` when the store cannot list its secrets.
pub fn as_listing_keystore(
    store: &dyn Keystore,
) -> Result<&dyn ListingKeystore, KeystoreError> {
    store.as_listing().ok_or(KeystoreError::ListingUnsupported)
}

/// A password-protected keystore persisted to a single file.
pub struct FileKeystore {
    path: PathBuf,
    password: SecureBytes,
    salt: String,
    secrets: BTreeMap<String, SecureBytes>,
}

impl FileKeystore {
    /// Opens the keystore at `path`, decrypting it with `password`.
    ///
    /// A missing file yields a fresh empty store which is written on the
    /// first [`Keystore::save`]. A present file must carry the supported
    /// format tag; any other tag fails with
    /// [`KeystoreError::VersionMismatch`], and structural problems past the
    /// tag fail with a corruption or decryption error.
    pub fn open(path: impl Into<PathBuf>, password: SecureBytes) -> Result<Self, KeystoreError> {
        let path = path.into();
        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(path, password, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "keystore file absent, starting empty");
                Ok(Self {
                    path,
                    password,
                    salt: crypto::generate_salt(),
                    secrets: BTreeMap::new(),
                })
            }
            Err(e) => Err(KeystoreError::FileIo { source: e }),
        }
    }

    fn parse(
        path: PathBuf,
        password: SecureBytes,
        contents: &str,
    ) -> Result<Self, KeystoreError> {
        let contents = contents.trim_end();

        let found = contents
            .get(..KEYSTORE_VERSION.len())
            .ok_or_else(|| KeystoreError::Corrupt {
                reason: "file is shorter than the format tag".to_string(),
            })?;
        if found != KEYSTORE_VERSION {
            return Err(KeystoreError::VersionMismatch {
                expected: KEYSTORE_VERSION.to_string(),
                found: found.to_string(),
            });
        }

        let payload = Base64::decode_vec(&contents[KEYSTORE_VERSION.len()..]).map_err(|e| {
            KeystoreError::Corrupt {
                reason: format!("invalid base64 payload: {e}"),
            }
        })?;
        if payload.len() < SALT_LENGTH + NONCE_LENGTH {
            return Err(KeystoreError::Corrupt {
                reason: format!(
                    "payload too short: {} bytes, need at least {}",
                    payload.len(),
                    SALT_LENGTH + NONCE_LENGTH
                ),
            });
        }

        let (salt_bytes, rest) = payload.split_at(SALT_LENGTH);
        let (nonce, ciphertext) = rest.split_at(NONCE_LENGTH);
        let salt = std::str::from_utf8(salt_bytes)
            .map_err(|_| KeystoreError::Corrupt {
                reason: "salt is not valid UTF-8".to_string(),
            })?
            .to_string();

        let key = crypto::derive_key(password.as_bytes(), &salt)?;
        let plaintext = crypto::decrypt(ciphertext, nonce, &key)?;

        let encoded: BTreeMap<String, String> =
            serde_json::from_slice(&plaintext).map_err(|e| KeystoreError::Serialization {
                source: e,
            })?;
        let mut secrets = BTreeMap::new();
        for (name, b64) in encoded {
            let bytes = Base64::decode_vec(&b64).map_err(|e| KeystoreError::Corrupt {
                reason: format!("secret {name:?} is not valid base64: {e}"),
            })?;
            secrets.insert(name, SecureBytes::new(bytes));
        }

        debug!(path = %path.display(), secrets = secrets.len(), "opened keystore");
        Ok(Self {
            path,
            password,
            salt,
            secrets,
        })
    }

    /// Returns the path this keystore persists to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the keystore file exists on disk
    pub fn is_persisted(&self) -> bool {
        self.path.exists()
    }

    fn render(&self) -> Result<String, KeystoreError> {
        let encoded: BTreeMap<&String, String> = self
            .secrets
            .iter()
            .map(|(name, secret)| (name, Base64::encode_string(secret.as_bytes())))
            .collect();
        let plaintext = Zeroizing::new(
            serde_json::to_vec(&encoded)
                .map_err(|e| KeystoreError::Serialization { source: e })?,
        );

        let key = crypto::derive_key(self.password.as_bytes(), &self.salt)?;
        let (ciphertext, nonce) = crypto::encrypt(&plaintext, &key)?;

        let mut payload = Vec::with_capacity(self.salt.len() + nonce.len() + ciphertext.len());
        payload.extend_from_slice(self.salt.as_bytes());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);

        Ok(format!("{KEYSTORE_VERSION}{}", Base64::encode_string(&payload)))
    }
}

impl Keystore for FileKeystore {
    fn retrieve(&self, name: &str) -> Result<SecureBytes, KeystoreError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| KeystoreError::SecretNotFound {
                name: name.to_string(),
            })
    }

    fn store(&mut self, name: &str, value: SecureBytes) {
        self.secrets.insert(name.to_string(), value);
    }

    fn delete(&mut self, name: &str) -> Result<(), KeystoreError> {
        match self.secrets.remove(name) {
            Some(_) => Ok(()),
            None => Err(KeystoreError::SecretNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Writes the encrypted store atomically: the contents are rendered to a
    /// temporary file in the target directory and moved into place.
    fn save(&self) -> Result<(), KeystoreError> {
        let contents = self.render()?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
            .map_err(|e| KeystoreError::FileIo { source: e })?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| KeystoreError::FileIo { source: e })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| KeystoreError::FileIo { source: e })?;
        }

        tmp.persist(&self.path)
            .map_err(|e| KeystoreError::FileIo { source: e.error })?;

        debug!(path = %self.path.display(), secrets = self.secrets.len(), "saved keystore");
        Ok(())
    }

    fn as_listing(&self) -> Option<&dyn ListingKeystore> {
        Some(self)
    }
}

impl ListingKeystore for FileKeystore {
    fn list(&self) -> Result<Vec<String>, KeystoreError> {
        Ok(self.secrets.keys().cloned().collect())
    }
}

impl fmt::Debug for FileKeystore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileKeystore")
            .field("path", &self.path)
            .field("secrets", &self.secrets.len())
            .finish_non_exhaustive()
    }
}
