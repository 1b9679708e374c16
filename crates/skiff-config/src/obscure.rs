//! Reversible obscuring of stored password values.
//!
//! Password-typed option values are never stored as cleartext, but they must
//! be recoverable to authenticate against the backend.  The [`Obscure`]
//! trait abstracts the encode/decode pair so the concrete scheme can be
//! swapped without touching the workflows.
//!
//! [`BuiltinObscurer`] seals the value under a key compiled into the binary.
//! This hides credentials from shoulder-surfing and casual file inspection
//! only — it is not a security boundary.  Whole-store encryption (a user
//! passphrase) is the actual protection layer.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::crypto;
use crate::error::{ConfigError, Result};

/// Encode/decode pair applied to password-typed values before storage.
pub trait Obscure {
    /// Encode a cleartext value for storage.
    fn obscure(&self, value: &str) -> Result<String>;

    /// Decode a stored value back to cleartext.
    fn reveal(&self, value: &str) -> Result<String>;
}

/// Fixed key compiled into every skiff binary.  Changing it orphans all
/// previously obscured values.
const BUILTIN_KEY: [u8; crypto::KEY_LEN] = [
    0x62, 0x38, 0xc0, 0x9d, 0x1f, 0x55, 0x21, 0xe3, 0x0a, 0x90, 0x47, 0x6e, 0xd2, 0x7b, 0x34, 0x8c,
    0x11, 0xfd, 0x6a, 0x05, 0xb9, 0x43, 0xee, 0x58, 0x2d, 0x81, 0x96, 0xca, 0x70, 0x1c, 0xaf, 0x24,
];

/// Default obscurer: sealed box under the built-in key, base64-url encoded.
pub struct BuiltinObscurer;

impl Obscure for BuiltinObscurer {
    fn obscure(&self, value: &str) -> Result<String> {
        let sealed = crypto::encrypt(value.as_bytes(), &BUILTIN_KEY)?;
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    fn reveal(&self, value: &str) -> Result<String> {
        let sealed = URL_SAFE_NO_PAD
            .decode(value.as_bytes())
            .map_err(|_| ConfigError::Validation("input too short when revealing password - is it obscured?".into()))?;
        let plain = crypto::decrypt(&sealed, &BUILTIN_KEY).map_err(|_| {
            ConfigError::Validation("failed to reveal password - is it obscured?".into())
        })?;
        String::from_utf8(plain)
            .map_err(|_| ConfigError::Validation("revealed password is not valid UTF-8".into()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obscure_reveal_roundtrip() {
        let obscurer = BuiltinObscurer;
        for value in ["", "potato", "correct horse battery staple", "pässwörd"] {
            let stored = obscurer.obscure(value).unwrap();
            assert_ne!(stored, value);
            assert_eq!(obscurer.reveal(&stored).unwrap(), value);
        }
    }

    #[test]
    fn obscured_values_differ_per_call() {
        let obscurer = BuiltinObscurer;
        let a = obscurer.obscure("same").unwrap();
        let b = obscurer.obscure("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn reveal_rejects_cleartext() {
        let obscurer = BuiltinObscurer;
        assert!(obscurer.reveal("never obscured").is_err());
    }
}
