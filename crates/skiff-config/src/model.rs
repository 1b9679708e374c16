//! In-memory configuration model.
//!
//! A [`ConfigData`] is an ordered collection of named sections, each holding
//! ordered `key = value` string pairs — one section per configured remote.
//! Key order within a section is insertion order and a key is unique within
//! its section (last write wins).  Section order is insertion order; sorting
//! for display is left to callers.
//!
//! The model also owns the plaintext INI codec: [`ConfigData::parse`] reads
//! the `[section]` / `key = value` text format (tolerating comment and blank
//! lines) and [`ConfigData::serialize`] writes it back.

use tracing::warn;

/// The whole in-memory store: all sections in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigData {
    sections: Vec<Section>,
}

/// One named group of key-value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    keys: Vec<(String, String)>,
}

impl ConfigData {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the plaintext INI format.
    ///
    /// Blank lines and comment lines (starting `;` or `#`) are skipped.
    /// Lines that fit neither the section-header nor the `key = value` shape
    /// are logged and ignored rather than failing the whole load.
    pub fn parse(text: &str) -> Self {
        let mut data = Self::new();
        let mut current: Option<String> = None;
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim();
                if name.is_empty() {
                    warn!(line = idx + 1, "empty section header - ignoring");
                    continue;
                }
                data.touch_section(name);
                current = Some(name.to_string());
            } else if let Some((key, value)) = line.split_once('=') {
                match &current {
                    Some(section) => {
                        data.set_value(section, key.trim(), value.trim());
                    }
                    None => warn!(line = idx + 1, "key outside any section - ignoring"),
                }
            } else {
                warn!(line = idx + 1, content = line, "malformed config line - ignoring");
            }
        }
        data
    }

    /// Serialize to the plaintext INI format.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&format!("[{}]\n", section.name));
            for (key, value) in &section.keys {
                out.push_str(&format!("{key} = {value}\n"));
            }
            out.push('\n');
        }
        out
    }

    /// Look up a stored value.
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, creating the section at the end of the store if needed.
    /// An existing key keeps its position; its value is replaced.
    pub fn set_value(&mut self, section: &str, key: &str, value: &str) {
        let section = self.touch_section(section);
        match section.keys.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => section.keys.push((key.to_string(), value.to_string())),
        }
    }

    /// Delete a key.  Returns `false` if the section or key did not exist.
    pub fn delete_key(&mut self, section: &str, key: &str) -> bool {
        let Some(section) = self.section_mut(section) else {
            return false;
        };
        let before = section.keys.len();
        section.keys.retain(|(k, _)| k != key);
        section.keys.len() != before
    }

    /// Delete a whole section.  Returns `false` if it did not exist.
    pub fn delete_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        self.sections.len() != before
    }

    /// Whether a section exists in the store.
    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Section names in insertion order.
    pub fn section_list(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }

    /// Key names of a section in insertion order.  Empty if the section does
    /// not exist.
    pub fn key_list(&self, section: &str) -> Vec<String> {
        self.section(section)
            .map(|s| s.keys.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether the store has no sections at all.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Find or append a section, returning a mutable handle.
    fn touch_section(&mut self, name: &str) -> &mut Section {
        if let Some(idx) = self.sections.iter().position(|s| s.name == name) {
            &mut self.sections[idx]
        } else {
            self.sections.push(Section {
                name: name.to_string(),
                keys: Vec::new(),
            });
            self.sections.last_mut().expect("section just pushed")
        }
    }
}

/// Whether `name` is acceptable as a remote name: non-empty, starting with a
/// word character, containing only word characters, dots and hyphens.  This
/// is the same pattern remote references use elsewhere in skiff.
pub fn is_valid_remote_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphanumeric() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Whether `name` could be confused with a drive letter (`C`, `d`, ...).
pub fn is_drive_letter(name: &str) -> bool {
    name.len() == 1 && name.chars().all(|c| c.is_ascii_alphabetic())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
