//! Store codec: plaintext INI or encrypted container.
//!
//! The on-disk format is selected by the first non-blank, non-comment line:
//!
//! - **Plaintext**: the INI section/key/value format, parsed by
//!   [`crate::model::ConfigData::parse`].
//! - **Encrypted v0**: the line is exactly [`ENCRYPT_SENTINEL`]; everything
//!   after it is base64-encoded `nonce(24) ∥ ciphertext ∥ tag(16)` of the
//!   plaintext INI payload.
//! - Any other line starting with [`ENCRYPT_PREFIX`] is a future encryption
//!   version and fails closed with an upgrade hint — it is never parsed as
//!   plaintext.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::crypto::{self, KEY_LEN, NONCE_LEN, TAG_LEN};
use crate::error::{ConfigError, Result};
use crate::model::ConfigData;

/// Marker line identifying the encrypted v0 format.
pub const ENCRYPT_SENTINEL: &str = "SKIFF_ENCRYPT_V0:";

/// Common prefix of all encryption version markers, current and future.
pub const ENCRYPT_PREFIX: &str = "SKIFF_ENCRYPT_V";

/// Human-readable header written above the sentinel in encrypted files.
const ENCRYPTED_HEADER: &str = "\
# Encrypted skiff configuration file
# Do not edit - any change breaks decryption.
";

/// The two shapes a config file can take on disk.
#[derive(Debug, PartialEq, Eq)]
pub enum Detected {
    /// Plain INI text, ready for [`ConfigData::parse`].
    Plaintext(String),
    /// The base64 body following the sentinel line.
    Encrypted(String),
}

/// Classify raw file bytes as plaintext or encrypted.
///
/// Scans past blank and comment (`;` / `#`) lines; the first substantive
/// line decides the format.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedEncryption`] for an unknown version
/// marker and [`ConfigError::Corrupt`] if the file is not valid UTF-8.
pub fn detect(bytes: &[u8]) -> Result<Detected> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| ConfigError::Corrupt("config file is not valid UTF-8".into()))?;

    let mut rest = text;
    loop {
        let Some((line, tail)) = split_line(rest) else {
            // Only blanks and comments: an effectively empty plaintext file.
            return Ok(Detected::Plaintext(text.to_string()));
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            rest = tail;
            continue;
        }
        if trimmed == ENCRYPT_SENTINEL {
            return Ok(Detected::Encrypted(tail.to_string()));
        }
        if trimmed.starts_with(ENCRYPT_PREFIX) {
            return Err(ConfigError::UnsupportedEncryption);
        }
        return Ok(Detected::Plaintext(text.to_string()));
    }
}

/// Split off the first line, returning `None` at end of input.
fn split_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.split_once('\n') {
        Some((line, tail)) => Some((line, tail)),
        None => Some((text, "")),
    }
}

/// Decode the base64 body of an encrypted file into the raw sealed box.
///
/// # Errors
///
/// Returns [`ConfigError::Corrupt`] on invalid base64 or a box too short to
/// hold a nonce and a tag.
pub fn decode_body(body: &str) -> Result<Vec<u8>> {
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let sealed = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ConfigError::Corrupt(format!("failed to load base64 encoded data: {e}")))?;
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(ConfigError::Corrupt("configuration data too short".into()));
    }
    Ok(sealed)
}

/// Serialize the store for disk.
///
/// With a key: header, blank line, sentinel, then the base64 sealed box of
/// the INI payload under a fresh random nonce.  Without: the INI text as-is.
pub fn encode(data: &ConfigData, key: Option<&[u8; KEY_LEN]>) -> Result<Vec<u8>> {
    let plaintext = data.serialize();
    let Some(key) = key else {
        return Ok(plaintext.into_bytes());
    };

    let sealed = crypto::encrypt(plaintext.as_bytes(), key)?;
    let mut out = String::new();
    out.push_str(ENCRYPTED_HEADER);
    out.push('\n');
    out.push_str(ENCRYPT_SENTINEL);
    out.push('\n');
    out.push_str(&STANDARD.encode(&sealed));
    out.push('\n');
    Ok(out.into_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
