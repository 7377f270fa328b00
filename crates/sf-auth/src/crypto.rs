//! Password/PIN hashing and at-rest encryption of stored secrets.
//!
//! Passwords and PINs are one-way argon2id hashes. Security tokens and client
//! secrets must be recoverable to log in, so they are sealed with
//! ChaCha20-Poly1305 under a 32-byte key kept in a local key file.

use std::path::Path;

use argon2::password_hash::rand_core::OsRng as SaltRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};

/// Key size for ChaCha20-Poly1305.
pub const KEY_SIZE: usize = 32;

/// Nonce size for ChaCha20-Poly1305.
pub const NONCE_SIZE: usize = 12;

/// Hash a password or PIN with argon2id and a random salt.
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut SaltRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::new(ErrorKind::Crypto(e.to_string())))
}

/// Verify a password or PIN against a stored argon2 hash.
///
/// A malformed stored hash verifies as `false`.
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Symmetric cipher for secrets stored in the local credential store.
///
/// Ciphertexts are hex strings of `nonce || ciphertext+tag`, with a fresh
/// random nonce per value.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: ChaCha20Poly1305,
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SecretCipher {
    /// Create a cipher from raw key bytes.
    pub fn from_key(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_SIZE {
            return Err(Error::new(ErrorKind::Config(format!(
                "encryption key must be {KEY_SIZE} bytes, got {}",
                key.len()
            ))));
        }
        Ok(Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        })
    }

    /// Generate a new random key, write it hex-encoded to `path` and return
    /// the cipher. An existing key file is never overwritten.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn create_key_file(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(Error::new(ErrorKind::Config(format!(
                "key file already exists: {}",
                path.display()
            ))));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        std::fs::write(path, hex::encode(key))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        debug!("Created encryption key file");
        Self::from_key(&key)
    }

    /// Load the cipher from an existing key file.
    ///
    /// A missing or malformed file is a configuration error.
    pub fn load_key_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::with_source(
                ErrorKind::Config(format!(
                    "cannot read key file {} (run `sfdesk init` first)",
                    path.display()
                )),
                e,
            )
        })?;
        let key = hex::decode(contents.trim()).map_err(|e| {
            Error::with_source(
                ErrorKind::Config(format!("key file {} is not valid hex", path.display())),
                e,
            )
        })?;
        Self::from_key(&key)
    }

    /// Encrypt a secret. Empty input stays empty.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| Error::new(ErrorKind::Crypto(format!("encryption failed: {e}"))))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    /// Decrypt a value produced by [`SecretCipher::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        if encoded.is_empty() {
            return Ok(String::new());
        }

        let sealed = hex::decode(encoded).map_err(|e| {
            Error::with_source(ErrorKind::Crypto("stored secret is not hex".into()), e)
        })?;
        if sealed.len() <= NONCE_SIZE {
            return Err(Error::new(ErrorKind::Crypto(
                "stored secret is truncated".to_string(),
            )));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                Error::new(ErrorKind::Crypto(
                    "decryption failed (wrong key or corrupted data)".to_string(),
                ))
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| Error::with_source(ErrorKind::Crypto("secret is not UTF-8".into()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_secret("hunter2", &hash));
        assert!(!verify_secret("hunter3", &hash));
    }

    #[test]
    fn test_same_input_different_hashes() {
        let h1 = hash_secret("123456").unwrap();
        let h2 = hash_secret("123456").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(!verify_secret("123456", "not-a-hash"));
        assert!(!verify_secret("123456", ""));
    }

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = SecretCipher::from_key(&[7u8; KEY_SIZE]).unwrap();
        let sealed = cipher.encrypt("security-token-value").unwrap();
        assert!(!sealed.contains("security-token-value"));
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "security-token-value");
    }

    #[test]
    fn test_encrypt_uses_fresh_nonce() {
        let cipher = SecretCipher::from_key(&[7u8; KEY_SIZE]).unwrap();
        assert_ne!(cipher.encrypt("x").unwrap(), cipher.encrypt("x").unwrap());
    }

    #[test]
    fn test_empty_secret_stays_empty() {
        let cipher = SecretCipher::from_key(&[1u8; KEY_SIZE]).unwrap();
        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.decrypt("").unwrap(), "");
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = SecretCipher::from_key(&[1u8; KEY_SIZE]).unwrap();
        let b = SecretCipher::from_key(&[2u8; KEY_SIZE]).unwrap();
        let sealed = a.encrypt("secret").unwrap();
        let err = b.decrypt(&sealed).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Crypto(_)));
    }

    #[test]
    fn test_bad_key_length() {
        let err = SecretCipher::from_key(&[0u8; 16]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[test]
    fn test_key_file_create_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("secret.key");

        let created = SecretCipher::create_key_file(&path).unwrap();
        let sealed = created.encrypt("abc").unwrap();

        let loaded = SecretCipher::load_key_file(&path).unwrap();
        assert_eq!(loaded.decrypt(&sealed).unwrap(), "abc");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        // Never overwrite an existing key.
        assert!(SecretCipher::create_key_file(&path).is_err());
    }

    #[test]
    fn test_missing_key_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = SecretCipher::load_key_file(&temp_dir.path().join("absent.key")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[test]
    fn test_malformed_key_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.key");
        std::fs::write(&path, "zz-not-hex").unwrap();
        let err = SecretCipher::load_key_file(&path).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }
}
