//! Cryptographic functions for the keystore
//!
//! Provides key derivation and payload encryption using:
//! - Argon2id for password-based key derivation
//! - AES-256-GCM for payload encryption

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng},
};
use argon2::{
    Argon2,
    password_hash::{SaltString, rand_core},
};
use zeroize::Zeroizing;

use super::errors::KeystoreError;

/// Salt string length for Argon2 (base64 encoded, 22 chars)
pub const SALT_LENGTH: usize = 22;

/// Nonce length for AES-GCM (12 bytes standard)
pub const NONCE_LENGTH: usize = 12;

/// Derived key length for AES-256 (32 bytes)
pub const KEY_LENGTH: usize = 32;

/// Generate a fresh random salt string (base64 encoded)
pub fn generate_salt() -> String {
    SaltString::generate(&mut rand_core::OsRng)
        .as_str()
        .to_string()
}

/// Derive an encryption key from a password and salt using Argon2id
///
/// # Arguments
/// * `password` - The keystore password
/// * `salt` - The salt string (base64 encoded, from [`generate_salt`])
///
/// # Returns
/// A 32-byte encryption key suitable for AES-256, zeroized on drop
pub fn derive_key(password: &[u8], salt: &str) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
    if salt.len() != SALT_LENGTH {
        return Err(KeystoreError::InvalidSaltLength {
            expected: SALT_LENGTH,
            actual: salt.len(),
        });
    }

    let salt = SaltString::from_b64(salt).map_err(|e| KeystoreError::Corrupt {
        reason: format!("invalid salt format: {e}"),
    })?;

    let argon2 = Argon2::default();

    let mut key = Zeroizing::new(vec![0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(password, salt.as_str().as_bytes(), key.as_mut_slice())
        .map_err(|e| KeystoreError::EncryptionFailed {
            reason: format!("key derivation failed: {e}"),
        })?;

    Ok(key)
}

/// Encrypt a payload with an encryption key
///
/// # Returns
/// A tuple of (ciphertext, nonce) where nonce is the random 12-byte nonce
/// used for encryption
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<(Vec<u8>, Vec<u8>), KeystoreError> {
    if key.len() != KEY_LENGTH {
        return Err(KeystoreError::EncryptionFailed {
            reason: format!(
                "invalid key length: expected {}, got {}",
                KEY_LENGTH,
                key.len()
            ),
        });
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| KeystoreError::EncryptionFailed {
        reason: format!("failed to create cipher: {e}"),
    })?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext =
        cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| KeystoreError::EncryptionFailed {
                reason: format!("encryption failed: {e}"),
            })?;

    Ok((ciphertext, nonce.to_vec()))
}

/// Decrypt a payload
///
/// # Arguments
/// * `ciphertext` - The encrypted payload
/// * `nonce` - The 12-byte nonce used for encryption
/// * `key` - The 32-byte encryption key
///
/// # Returns
/// The decrypted payload, zeroized on drop
pub fn decrypt(
    ciphertext: &[u8],
    nonce: &[u8],
    key: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
    if key.len() != KEY_LENGTH {
        return Err(KeystoreError::DecryptionFailed {
            reason: format!(
                "invalid key length: expected {}, got {}",
                KEY_LENGTH,
                key.len()
            ),
        });
    }

    if nonce.len() != NONCE_LENGTH {
        return Err(KeystoreError::InvalidNonceLength {
            expected: NONCE_LENGTH,
            actual: nonce.len(),
        });
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| KeystoreError::DecryptionFailed {
        reason: format!("failed to create cipher: {e}"),
    })?;

    let nonce = Nonce::from_slice(nonce);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| KeystoreError::DecryptionFailed {
            reason: format!("decryption failed: {e}"),
        })?;

    Ok(Zeroizing::new(plaintext))
}
