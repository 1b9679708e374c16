//! Configuration store for skiff.
//!
//! This crate reads, writes and edits the skiff config file: named "remote"
//! sections of key-value parameters describing how to reach a storage
//! backend, optionally encrypted at rest with a password-derived key, and
//! rewritten atomically on every save.
//!
//! # Modules
//!
//! - [`model`] — ordered section/key model and the plaintext INI codec.
//! - [`codec`] — plaintext/encrypted container format and sentinel handling.
//! - [`crypto`] — passphrase normalization, key derivation, sealed box.
//! - [`persist`] — crash-safe atomic rewrite with a one-generation backup.
//! - [`session`] — the owned store state passed to all operations.
//! - [`env`] — environment-variable overrides and env-declared sections.
//! - [`registry`] — backend type → option schema collaborator types.
//! - [`obscure`] — reversible encoding for stored password values.
//! - [`error`] — unified error types.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use skiff_config::{NoPrompt, Session, default_config_path};
//!
//! # fn example() -> skiff_config::Result<()> {
//! let mut session = Session::new(default_config_path());
//! session.load(&mut NoPrompt)?;
//!
//! session.set("backup", "type", "sftp");
//! session.set("backup", "host", "example.com");
//! session.save()?;
//!
//! assert_eq!(session.get("backup", "host").as_deref(), Some("example.com"));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod crypto;
pub mod env;
pub mod error;
pub mod model;
pub mod obscure;
pub mod persist;
pub mod registry;
pub mod session;

// Re-export the most commonly used types at the crate root for convenience.
pub use error::{ConfigError, Result};
pub use model::{ConfigData, is_drive_letter, is_valid_remote_name};
pub use obscure::{BuiltinObscurer, Obscure};
pub use registry::{Backend, BackendOption, OptionExample, Registry};
pub use session::{
    CONFIG_AUTOMATIC, NoPrompt, PasswordPrompt, Session, default_config_path,
};
