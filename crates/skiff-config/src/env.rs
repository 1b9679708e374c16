//! Environment variable integration.
//!
//! Every `(section, key)` pair maps to an environment variable that, when
//! present, overrides the stored value at read time.  The transform is
//! round-trip-stable for names made of letters, digits and hyphens:
//! `("my-remote", "host")` → `SKIFF_CONFIG_MY_REMOTE_HOST`.
//!
//! Sections can also exist purely in the environment: a variable matching
//! `SKIFF_CONFIG_<NAME>_TYPE` declares a section `<name>` even when it is
//! absent from the on-disk store.

use std::sync::LazyLock;

use regex::Regex;

/// Namespace prefix for all per-key override variables.
pub const ENV_PREFIX: &str = "SKIFF_CONFIG_";

/// Variable holding the store passphrase.  When set and valid it disables
/// interactive password prompting.
pub const PASSWORD_VAR: &str = "SKIFF_CONFIG_PASS";

/// Detects environment-declared sections by their `_TYPE` variable.
static SECTION_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SKIFF_CONFIG_(.+)_TYPE$").expect("static regex is valid"));

/// Convert a `(section, key)` pair into its override variable name.
pub fn config_to_env(section: &str, key: &str) -> String {
    let joined = format!("{section}_{key}").to_uppercase().replace('-', "_");
    format!("{ENV_PREFIX}{joined}")
}

/// Current override value for `(section, key)`, if set in the environment.
pub fn var(section: &str, key: &str) -> Option<String> {
    std::env::var(config_to_env(section, key)).ok()
}

/// Section names declared purely by environment variables, lowercased.
pub fn declared_sections() -> Vec<String> {
    let mut sections = Vec::new();
    for (name, _) in std::env::vars() {
        if let Some(captures) = SECTION_VAR.captures(&name) {
            sections.push(captures[1].to_lowercase());
        }
    }
    sections
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
