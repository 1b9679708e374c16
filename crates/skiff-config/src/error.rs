//! Error types for the skiff configuration store.
//!
//! All operations in this crate surface errors through [`ConfigError`], the
//! single error type returned by every public API.  Variants carry enough
//! context for callers to decide how to handle the failure without inspecting
//! opaque strings.

use thiserror::Error;

/// Alias for `Result<T, ConfigError>`.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Unified error type for the skiff configuration store.
#[derive(Debug, Error)]
pub enum ConfigError {
    // -- Load errors --------------------------------------------------------
    /// The config file does not exist.  Callers treat this as "start from an
    /// empty store", not as a fatal condition.
    #[error("config file not found")]
    NotFound,

    /// The file carries an encryption version marker newer than this build
    /// understands.  Never parsed as plaintext.
    #[error("unsupported configuration encryption - update skiff for support")]
    UnsupportedEncryption,

    /// The encrypted payload is structurally broken (bad base64, truncated).
    #[error("corrupt encrypted configuration: {0}")]
    Corrupt(String),

    // -- Password errors ----------------------------------------------------
    /// The ciphertext failed authentication.  Recovered locally by
    /// re-prompting for the password, never silently ignored.
    #[error("couldn't decrypt configuration, most likely wrong password")]
    AuthenticationFailed,

    /// The store is encrypted, no key is held, and interactive prompting is
    /// disallowed.
    #[error(
        "unable to decrypt configuration and not allowed to ask for password - \
         set SKIFF_CONFIG_PASS to your configuration password"
    )]
    NeedPassword,

    /// Passphrase bytes are not valid UTF-8.  Rejected before any
    /// cryptographic use.
    #[error("password contains invalid utf8 characters")]
    InvalidEncoding,

    // -- Validation ---------------------------------------------------------
    /// A user-supplied value was rejected (bad remote name, odd key/value
    /// count, empty passphrase).  The store is left unmodified.
    #[error("{0}")]
    Validation(String),

    // -- Underlying errors --------------------------------------------------
    /// A cryptographic primitive failed (RNG exhaustion, seal failure).
    #[error("crypto failure: {0}")]
    Crypto(String),

    /// JSON serialization failed (dump / providers listing).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure during load or persistence.  Fatal to the calling
    /// operation: once a rename sequence has begun the on-disk state cannot
    /// be retried safely.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
