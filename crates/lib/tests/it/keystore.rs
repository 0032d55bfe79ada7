//! Tests for the encrypted file keystore and its versioned on-disk format.

use fieldvault::keystore::{
    FileKeystore, KEYSTORE_VERSION, Keystore, KeystoreError, SecureBytes, as_listing_keystore,
};
use tempfile::TempDir;

fn keystore_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("keystore")
}

#[test]
fn test_version_mismatch_is_reported_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = keystore_path(&dir);
    std::fs::write(
        &path,
        "v1pqH8nRJNCuKLrAHwATQuHpdLcP84sATrxtKMWTvapZTRcoEODVJKf2dsHXiOhSMh1EFrJTikON2oF5wZv4IM37lkJ6wt79MCFaXDqlNxBQtIA9w6vaxWnbS+92rQqtka7WrzTxal1Pd3mcK0o+ow7EAJg553UvxBqA==",
    )
    .unwrap();

    let err = FileKeystore::open(&path, SecureBytes::from("")).unwrap_err();
    assert!(matches!(err, KeystoreError::VersionMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "keystore format doesn't match expected version: 'v2' got 'v1'"
    );
}

#[test]
fn test_round_trip_and_listing() {
    let dir = TempDir::new().unwrap();
    let path = keystore_path(&dir);

    let mut ks = FileKeystore::open(&path, SecureBytes::from("password")).unwrap();
    assert!(!ks.is_persisted());

    ks.store("key", SecureBytes::from("secret"));
    ks.save().unwrap();
    assert!(ks.is_persisted());

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with(KEYSTORE_VERSION));

    let reopened = FileKeystore::open(&path, SecureBytes::from("password")).unwrap();
    assert_eq!(reopened.retrieve("key").unwrap(), SecureBytes::from("secret"));

    let listing = as_listing_keystore(&reopened).unwrap();
    assert_eq!(listing.list().unwrap(), ["key"]);
}

#[test]
fn test_wrong_password_fails_to_decrypt() {
    let dir = TempDir::new().unwrap();
    let path = keystore_path(&dir);

    let mut ks = FileKeystore::open(&path, SecureBytes::from("password")).unwrap();
    ks.store("key", SecureBytes::from("secret"));
    ks.save().unwrap();

    let err = FileKeystore::open(&path, SecureBytes::from("wrong")).unwrap_err();
    assert!(matches!(err, KeystoreError::DecryptionFailed { .. }));
}

#[test]
fn test_listing_is_sorted() {
    let dir = TempDir::new().unwrap();
    let mut ks = FileKeystore::open(keystore_path(&dir), SecureBytes::from("pw")).unwrap();

    ks.store("charlie", SecureBytes::from("3"));
    ks.store("alpha", SecureBytes::from("1"));
    ks.store("bravo", SecureBytes::from("2"));

    let listing = as_listing_keystore(&ks).unwrap();
    assert_eq!(listing.list().unwrap(), ["alpha", "bravo", "charlie"]);
}

#[test]
fn test_retrieve_missing_secret() {
    let dir = TempDir::new().unwrap();
    let ks = FileKeystore::open(keystore_path(&dir), SecureBytes::from("pw")).unwrap();

    let err = ks.retrieve("nope").unwrap_err();
    assert!(matches!(err, KeystoreError::SecretNotFound { name } if name == "nope"));
}

#[test]
fn test_delete_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = keystore_path(&dir);

    let mut ks = FileKeystore::open(&path, SecureBytes::from("pw")).unwrap();
    ks.store("keep", SecureBytes::from("1"));
    ks.store("drop", SecureBytes::from("2"));
    ks.save().unwrap();

    ks.delete("drop").unwrap();
    ks.save().unwrap();

    let reopened = FileKeystore::open(&path, SecureBytes::from("pw")).unwrap();
    let listing = as_listing_keystore(&reopened).unwrap();
    assert_eq!(listing.list().unwrap(), ["keep"]);

    assert!(matches!(
        reopened.retrieve("drop"),
        Err(KeystoreError::SecretNotFound { .. })
    ));
}

#[test]
fn test_delete_missing_secret() {
    let dir = TempDir::new().unwrap();
    let mut ks = FileKeystore::open(keystore_path(&dir), SecureBytes::from("pw")).unwrap();

    assert!(matches!(
        ks.delete("nope"),
        Err(KeystoreError::SecretNotFound { .. })
    ));
}

#[test]
fn test_corrupt_payload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = keystore_path(&dir);

    std::fs::write(&path, "v2!!!not-base64!!!").unwrap();
    let err = FileKeystore::open(&path, SecureBytes::from("pw")).unwrap_err();
    assert!(matches!(err, KeystoreError::Corrupt { .. }));
}

#[test]
fn test_file_shorter_than_format_tag() {
    let dir = TempDir::new().unwrap();
    let path = keystore_path(&dir);

    std::fs::write(&path, "v").unwrap();
    let err = FileKeystore::open(&path, SecureBytes::from("pw")).unwrap_err();
    assert!(matches!(err, KeystoreError::Corrupt { .. }));
}

#[test]
fn test_secure_bytes_debug_is_redacted() {
    let secret = SecureBytes::from("hunter2");
    assert_eq!(format!("{secret:?}"), "SecureBytes(<redacted>)");
}

#[cfg(unix)]
#[test]
fn test_saved_file_has_restrictive_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = keystore_path(&dir);

    let mut ks = FileKeystore::open(&path, SecureBytes::from("pw")).unwrap();
    ks.store("key", SecureBytes::from("secret"));
    ks.save().unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
