//! The configuration session.
//!
//! A [`Session`] owns everything the workflows operate on: the in-memory
//! [`ConfigData`], the derived encryption key (if any), the config file path
//! and the interaction flags.  There is no process-global state — passing
//! the session around keeps retry/reprompt loops and tests deterministic.
//!
//! Lifecycle: `load` reads and (if needed) decrypts the file into memory;
//! workflow operations mutate the in-memory copy; `save` serializes through
//! the codec and rewrites the file atomically.  The in-memory and on-disk
//! copies may diverge between loads; readers of individual keys always see
//! the in-memory copy, with environment variables taking precedence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::codec::{self, Detected};
use crate::crypto::{self, KEY_LEN};
use crate::env;
use crate::error::{ConfigError, Result};
use crate::model::ConfigData;
use crate::persist;

/// Name of the config file in the XDG config directory.
pub const CONFIG_FILE_NAME: &str = "skiff.conf";

/// Name of the hidden config file in the home directory.
pub const HIDDEN_CONFIG_FILE_NAME: &str = ".skiff.conf";

/// Key marking a section as automatically configured.
pub const CONFIG_AUTOMATIC: &str = "config_automatic";

// ---------------------------------------------------------------------------
// Password prompting seam
// ---------------------------------------------------------------------------

/// Source of interactively-entered passphrases.
///
/// The terminal implementation lives in the CLI crate; tests supply scripted
/// input.  `load` only consults the prompt when the store is encrypted, no
/// key is held and `SKIFF_CONFIG_PASS` did not produce one.
pub trait PasswordPrompt {
    /// Read one passphrase, echoing the given prompt first.
    fn read_password(&mut self, prompt: &str) -> Result<String>;
}

/// A prompt source that always refuses.  Useful for non-interactive callers.
pub struct NoPrompt;

impl PasswordPrompt for NoPrompt {
    fn read_password(&mut self, _prompt: &str) -> Result<String> {
        Err(ConfigError::NeedPassword)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owned state for one configuration store.
pub struct Session {
    path: PathBuf,
    data: ConfigData,
    key: Option<[u8; KEY_LEN]>,
    /// Allow interactive password prompting while loading.
    pub ask_password: bool,
    /// Answer yes to confirmation prompts automatically.
    pub auto_confirm: bool,
}

impl Session {
    /// Create an empty session for the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: ConfigData::new(),
            key: None,
            ask_password: true,
            auto_confirm: false,
        }
    }

    /// Path of the backing config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a derived key is currently held (saves will encrypt).
    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    // -- Load / save --------------------------------------------------------

    /// Load the config file, decrypting if needed.
    ///
    /// A missing file is not an error: the session starts from an empty
    /// store.  For an encrypted file the key is obtained from
    /// `SKIFF_CONFIG_PASS` if set (consumed at most once), else from
    /// `prompt` — unless [`Session::ask_password`] is false, in which case
    /// loading fails with [`ConfigError::NeedPassword`].
    pub fn load(&mut self, prompt: &mut dyn PasswordPrompt) -> Result<()> {
        let bytes = match self.read_file() {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => {
                info!(path = %self.path.display(), "config file not found - using defaults");
                self.data = ConfigData::new();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match codec::detect(&bytes)? {
            Detected::Plaintext(text) => {
                self.data = ConfigData::parse(&text);
            }
            Detected::Encrypted(body) => {
                let plain = self.unlock(&body, prompt)?;
                let text = String::from_utf8(plain)
                    .map_err(|_| ConfigError::Corrupt("decrypted payload is not valid UTF-8".into()))?;
                self.data = ConfigData::parse(&text);
            }
        }
        debug!(path = %self.path.display(), "using config file");
        Ok(())
    }

    /// Read the raw config file, mapping absence to [`ConfigError::NotFound`].
    fn read_file(&self) -> Result<Vec<u8>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Acquire a key and decrypt the sealed body, retrying on bad passwords.
    ///
    /// The environment passphrase is one-shot: after any failed decrypt both
    /// the derived key and the cached `SKIFF_CONFIG_PASS` value are
    /// discarded, and later rounds go to the interactive prompt.  Interactive
    /// retries are unbounded.
    fn unlock(&mut self, body: &str, prompt: &mut dyn PasswordPrompt) -> Result<Vec<u8>> {
        let sealed = codec::decode_body(body)?;
        let mut env_password = std::env::var_os(env::PASSWORD_VAR);

        loop {
            if self.key.is_none() {
                if let Some(raw) = env_password.as_ref() {
                    match self.set_password_from_env(raw.as_encoded_bytes()) {
                        Ok(()) => debug!("using {} password", env::PASSWORD_VAR),
                        Err(e) => warn!(error = %e, "{} rejected", env::PASSWORD_VAR),
                    }
                }
            }
            if self.key.is_none() {
                if !self.ask_password {
                    return Err(ConfigError::NeedPassword);
                }
                while self.key.is_none() {
                    let password = prompt.read_password("Enter configuration password:")?;
                    if let Err(e) = self.set_password(&password) {
                        warn!(error = %e, "bad password");
                    }
                }
            }

            let Some(key) = self.key else { continue };
            match crypto::decrypt(&sealed, &key) {
                Ok(plain) => return Ok(plain),
                Err(ConfigError::AuthenticationFailed) => {
                    error!("couldn't decrypt configuration, most likely wrong password");
                    self.key = None;
                    env_password = None;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Serialize the store (encrypting when a key is held) and rewrite the
    /// file atomically.
    pub fn save(&self) -> Result<()> {
        let bytes = codec::encode(&self.data, self.key.as_ref())?;
        persist::atomic_write(&self.path, &bytes)
    }

    /// Set `key` in `section` and save just that value: the on-disk store is
    /// reloaded first and only the one value is merged in, so concurrent
    /// edits to other keys survive.  If the file has not been written yet
    /// the in-memory set is all that happens.
    pub fn set_value_and_save(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
        prompt: &mut dyn PasswordPrompt,
    ) -> Result<()> {
        // Keep the value in memory in case the reload fails.
        self.data.set_value(section, key, value);

        if !self.path.exists() {
            return Ok(());
        }
        let mut reloaded = Session::new(self.path.clone());
        reloaded.key = self.key;
        reloaded.ask_password = self.ask_password;
        reloaded.load(prompt)?;
        if !reloaded.data.has_section(section) {
            return Err(ConfigError::Validation(format!(
                "section {section:?} not found in config file"
            )));
        }
        reloaded.data.set_value(section, key, value);
        self.data = reloaded.data;
        self.key = reloaded.key;
        self.save()
    }

    // -- Encryption state ---------------------------------------------------

    /// Derive and hold the store key from `password`.  The next save
    /// encrypts.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        let password = crypto::check_password(password)?;
        self.key = Some(crypto::derive_key(&password));
        Ok(())
    }

    /// Byte-level variant for the environment passphrase, which may not be
    /// valid UTF-8.
    fn set_password_from_env(&mut self, raw: &[u8]) -> Result<()> {
        let password = crypto::check_password_bytes(raw)?;
        self.key = Some(crypto::derive_key(&password));
        Ok(())
    }

    /// Drop the held key.  The next save writes plaintext.
    pub fn clear_password(&mut self) {
        self.key = None;
    }

    // -- Reads (environment overrides apply) --------------------------------

    /// Get a value.  An environment override present at call time wins over
    /// the stored value.
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        if let Some(value) = env::var(section, key) {
            return Some(value);
        }
        self.data.value(section, key).map(str::to_string)
    }

    /// [`Session::get`] with a default for missing values.
    pub fn get_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get(section, key).unwrap_or_else(|| default.to_string())
    }

    /// Get a boolean.  An unparsable override or stored value is logged and
    /// skipped, never fatal.
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        if let Some(raw) = env::var(section, key) {
            match parse_bool(&raw) {
                Some(value) => return value,
                None => warn!(
                    var = %env::config_to_env(section, key),
                    value = %raw,
                    "couldn't parse as bool - ignoring"
                ),
            }
        }
        match self.data.value(section, key) {
            None => default,
            Some(raw) => parse_bool(raw).unwrap_or_else(|| {
                warn!(section, key, value = %raw, "couldn't parse as bool - ignoring");
                default
            }),
        }
    }

    /// Get an integer.  Same fallback rules as [`Session::get_bool`].
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        if let Some(raw) = env::var(section, key) {
            match raw.parse::<i64>() {
                Ok(value) => return value,
                Err(e) => warn!(
                    var = %env::config_to_env(section, key),
                    value = %raw,
                    error = %e,
                    "couldn't parse as int - ignoring"
                ),
            }
        }
        match self.data.value(section, key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(section, key, value = %raw, error = %e, "couldn't parse as int - ignoring");
                default
            }),
        }
    }

    // -- Writes (in-memory only; call `save` to persist) --------------------

    /// Set a value in memory.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.data.set_value(section, key, value);
    }

    /// Delete a key.  Returns whether it existed.
    pub fn delete_key(&mut self, section: &str, key: &str) -> bool {
        self.data.delete_key(section, key)
    }

    /// Delete a section.  Returns whether it existed.
    pub fn delete_section(&mut self, name: &str) -> bool {
        self.data.delete_section(name)
    }

    // -- Listings -----------------------------------------------------------

    /// Stored section names, in insertion order.
    pub fn section_list(&self) -> Vec<String> {
        self.data.section_list()
    }

    /// All section names including those declared purely by environment
    /// variables following the `SKIFF_CONFIG_<NAME>_TYPE` convention.
    pub fn sections(&self) -> Vec<String> {
        let mut sections = self.data.section_list();
        for name in env::declared_sections() {
            if !sections.contains(&name) {
                sections.push(name);
            }
        }
        sections
    }

    /// Key names of a section, in insertion order.
    pub fn key_list(&self, section: &str) -> Vec<String> {
        self.data.key_list(section)
    }

    /// Whether a section exists in the store.
    pub fn has_section(&self, name: &str) -> bool {
        self.data.has_section(name)
    }

    // -- Bulk views ---------------------------------------------------------

    /// The whole store as pretty-printed JSON, `name → {key → value}`, with
    /// environment overrides applied.
    pub fn dump_json(&self) -> Result<String> {
        let mut dump: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for name in self.data.section_list() {
            let mut params = BTreeMap::new();
            for key in self.data.key_list(&name) {
                params.insert(key.clone(), self.get_or(&name, &key, ""));
            }
            dump.insert(name, params);
        }
        Ok(serde_json::to_string_pretty(&dump)?)
    }

    /// The decrypted store in its plaintext serialization, with a
    /// placeholder comment when empty.
    pub fn show(&self) -> String {
        if self.data.is_empty() {
            "; empty config\n".to_string()
        } else {
            self.data.serialize()
        }
    }
}

/// Parse the usual spellings of a boolean config value.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config file location
// ---------------------------------------------------------------------------

/// Work out the default config file path.
///
/// Preference order: an existing `$XDG_CONFIG_HOME/skiff/skiff.conf`, an
/// existing `$HOME/.skiff.conf`, a freshly created XDG location, the home
/// fallback, and finally the current directory when no home can be found.
pub fn default_config_path() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let xdg_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| home.as_ref().map(|h| h.join(".config")))
        .map(|d| d.join("skiff"));

    let xdg_conf = xdg_dir.as_ref().map(|d| d.join(CONFIG_FILE_NAME));
    if let Some(path) = &xdg_conf {
        if path.exists() {
            return path.clone();
        }
    }

    let home_conf = home.as_ref().map(|h| h.join(HIDDEN_CONFIG_FILE_NAME));
    if let Some(path) = &home_conf {
        if path.exists() {
            return path.clone();
        }
    }

    if let (Some(dir), Some(path)) = (&xdg_dir, &xdg_conf) {
        if std::fs::create_dir_all(dir).is_ok() {
            return path.clone();
        }
    }

    if let Some(path) = home_conf {
        return path;
    }

    error!("couldn't find home directory or read HOME or XDG_CONFIG_HOME environment variables");
    error!("defaulting to storing config in current directory - use --config to work around");
    PathBuf::from(HIDDEN_CONFIG_FILE_NAME)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
