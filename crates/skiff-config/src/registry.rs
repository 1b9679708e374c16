//! Backend registry collaborator types.
//!
//! The registry maps a backend type name to its option schema and an
//! optional interactive setup callback.  The config store itself never
//! defines backends — the hosting binary registers them at startup and the
//! workflows look them up by the `type` key of a remote.

use serde::Serialize;

use crate::error::Result;
use crate::session::Session;

/// One suggested value for an option, shown in the numbered chooser.
#[derive(Debug, Clone, Serialize)]
pub struct OptionExample {
    pub value: String,
    pub help: String,
}

/// One declared option of a backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendOption {
    pub name: String,
    pub help: String,
    /// Password-typed options are obscured before storage and masked in
    /// listings.
    pub is_password: bool,
    /// Optional options may be left blank.
    pub optional: bool,
    /// Example values; when non-empty the option is prompted as a numbered
    /// pick-or-type-your-own list.
    pub examples: Vec<OptionExample>,
}

impl BackendOption {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            is_password: false,
            optional: false,
            examples: Vec::new(),
        }
    }

    pub fn password(mut self) -> Self {
        self.is_password = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_examples(mut self, examples: &[(&str, &str)]) -> Self {
        self.examples = examples
            .iter()
            .map(|(value, help)| OptionExample {
                value: value.to_string(),
                help: help.to_string(),
            })
            .collect();
        self
    }
}

/// Backend-specific interactive setup, run after the declared options are
/// collected.  Receives the session and the remote name.
pub type SetupFn = fn(&mut Session, &str) -> Result<()>;

/// A registered backend type.
#[derive(Debug, Clone, Serialize)]
pub struct Backend {
    pub name: String,
    pub description: String,
    pub options: Vec<BackendOption>,
    /// Interactive setup callback, if the backend declares one.
    #[serde(skip)]
    pub setup: Option<SetupFn>,
}

/// Lookup table of all known backend types.
#[derive(Debug, Default, Serialize)]
pub struct Registry {
    backends: Vec<Backend>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend.  Later registrations with the same name shadow
    /// earlier ones in [`Registry::find`].
    pub fn register(&mut self, backend: Backend) {
        self.backends.insert(0, backend);
    }

    /// Look up a backend by type name.
    pub fn find(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// All registered backends.
    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    /// All backends and their option schemas as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.backends)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
