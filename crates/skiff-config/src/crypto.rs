//! Passphrase handling and authenticated encryption for the config store.
//!
//! This module provides the cryptographic primitives behind encrypted
//! persistence:
//!
//! - **Passphrase checking**: UTF-8 validation and NFKC normalization so
//!   visually-identical but differently-encoded input derives the same key.
//! - **Key derivation**: SHA-256 over a fixed wrapper string concatenated
//!   with the passphrase.  The wrapper domain-separates this key from any
//!   other use of the same passphrase; the full 32-byte digest is used as
//!   the symmetric key.
//! - **Sealed box**: XChaCha20-Poly1305 with a randomly generated 24-byte
//!   nonce prepended to the ciphertext.
//! - **Random generation**: cryptographically secure random bytes via `ring`.
//!
//! # Security Notes
//!
//! - Nonces are generated randomly for every encryption operation and never
//!   reused; with 192 bits of nonce the collision probability is negligible.
//! - The derived key lives only in process memory and is never persisted.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

use crate::error::{ConfigError, Result};

/// Length of the symmetric key in bytes (SHA-256 digest size).
pub const KEY_LEN: usize = 32;

/// Length of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Length of the Poly1305 authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Wrapper mixed into the key hash.  Changing it invalidates every
/// previously encrypted config file.
const KEY_WRAPPER: (&str, &str) = ("[", "][skiff-config]");

// ---------------------------------------------------------------------------
// Passphrase handling
// ---------------------------------------------------------------------------

/// Normalize and validate a passphrase.
///
/// Leading or trailing whitespace is warned about but kept: earlier versions
/// of skiff stripped it, and the change is surfaced so users with padded
/// passwords understand why decryption may fail.  The NFKC-normalized form
/// is returned.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] if the passphrase is empty or
/// whitespace-only after normalization.
pub fn check_password(password: &str) -> Result<String> {
    if password.trim().len() != password.len() {
        warn!(
            "password contains leading/trailing whitespace - \
             in previous versions of skiff this was stripped"
        );
    }
    let password: String = password.nfkc().collect();
    if password.is_empty() || password.trim().is_empty() {
        return Err(ConfigError::Validation("no characters in password".into()));
    }
    Ok(password)
}

/// Byte-level entry point for passphrases arriving from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEncoding`] if `bytes` is not valid UTF-8,
/// before any cryptographic use, plus everything [`check_password`] returns.
pub fn check_password_bytes(bytes: &[u8]) -> Result<String> {
    let password = std::str::from_utf8(bytes).map_err(|_| ConfigError::InvalidEncoding)?;
    check_password(password)
}

/// Derive the symmetric key from an already-checked passphrase.
///
/// Deterministic: the same normalized passphrase always yields the same key.
pub fn derive_key(password: &str) -> [u8; KEY_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(KEY_WRAPPER.0.as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(KEY_WRAPPER.1.as_bytes());
    hasher.finalize().into()
}

// ---------------------------------------------------------------------------
// Sealed box
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` under `key`, returning `nonce ∥ ciphertext ∥ tag`.
///
/// A fresh random 24-byte nonce is generated per call and written to the
/// front of the output.
///
/// # Errors
///
/// Returns [`ConfigError::Crypto`] if the system RNG or the seal operation
/// fails.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| ConfigError::Crypto("failed to generate random nonce".into()))?;

    let cipher = XChaCha20Poly1305::new(key.as_slice().into());
    let sealed = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| ConfigError::Crypto("seal failed".into()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt a `nonce ∥ ciphertext ∥ tag` box produced by [`encrypt`].
///
/// # Errors
///
/// Returns [`ConfigError::Corrupt`] if the box is shorter than a nonce plus
/// a tag, and [`ConfigError::AuthenticationFailed`] if the key is wrong or
/// the data has been tampered with.  No partially decrypted payload is ever
/// returned.
pub fn decrypt(data: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(ConfigError::Corrupt("configuration data too short".into()));
    }
    let (nonce, sealed) = data.split_at(NONCE_LEN);
    let cipher = XChaCha20Poly1305::new(key.as_slice().into());
    cipher
        .decrypt(XNonce::from_slice(nonce), sealed)
        .map_err(|_| ConfigError::AuthenticationFailed)
}

// ---------------------------------------------------------------------------
// Random bytes
// ---------------------------------------------------------------------------

/// Generate `len` cryptographically secure random bytes.
///
/// # Errors
///
/// Returns [`ConfigError::Crypto`] if the system CSPRNG fails.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| ConfigError::Crypto("failed to generate random bytes".into()))?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_deterministic() {
        let k1 = derive_key("hunter2");
        let k2 = derive_key("hunter2");
        assert_eq!(k1, k2);
        assert_ne!(k1, derive_key("hunter3"));
    }

    #[test]
    fn whitespace_is_kept_not_stripped() {
        // The warning is non-fatal; the padded form derives a different key
        // because whitespace is part of the passphrase.
        let plain = check_password("secret").unwrap();
        let padded = check_password("  secret  ").unwrap();
        assert_eq!(padded, "  secret  ");
        assert_ne!(derive_key(&plain), derive_key(&padded));
    }

    #[test]
    fn nfkc_equivalent_input_derives_same_key() {
        // U+212B ANGSTROM SIGN normalizes to U+00C5.
        let a = check_password("caf\u{212b}").unwrap();
        let b = check_password("caf\u{00c5}").unwrap();
        assert_eq!(derive_key(&a), derive_key(&b));
    }

    #[test]
    fn empty_passwords_rejected() {
        assert!(check_password("").is_err());
        assert!(check_password("   ").is_err());
        assert!(check_password("\t\n").is_err());
    }

    #[test]
    fn invalid_utf8_rejected() {
        let result = check_password_bytes(&[0x66, 0xff, 0x6f]);
        assert!(matches!(result, Err(ConfigError::InvalidEncoding)));
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = derive_key("hunter2");
        let plaintext = b"[remote]\ntype = sftp\n";

        let sealed = encrypt(plaintext, &key).unwrap();
        assert_eq!(sealed.len(), plaintext.len() + NONCE_LEN + TAG_LEN);

        let opened = decrypt(&sealed, &key).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn fresh_nonce_every_save() {
        let key = derive_key("hunter2");
        let a = encrypt(b"same payload", &key).unwrap();
        let b = encrypt(b"same payload", &key).unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }

    #[test]
    fn wrong_key_fails_cleanly() {
        let sealed = encrypt(b"secret data", &derive_key("right")).unwrap();
        let result = decrypt(&sealed, &derive_key("wrong"));
        assert!(matches!(result, Err(ConfigError::AuthenticationFailed)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = derive_key("hunter2");
        let mut sealed = encrypt(b"secret data", &key).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(decrypt(&sealed, &key).is_err());
    }

    #[test]
    fn short_box_is_corrupt_not_panic() {
        let key = derive_key("hunter2");
        let result = decrypt(&[0u8; NONCE_LEN + TAG_LEN - 1], &key);
        assert!(matches!(result, Err(ConfigError::Corrupt(_))));
    }

    #[test]
    fn random_bytes_length_and_variety() {
        let a = random_bytes(16).unwrap();
        let b = random_bytes(16).unwrap();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
