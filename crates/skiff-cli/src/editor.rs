//! Interactive remote lifecycle workflow.
//!
//! A menu-driven state machine over the session: browse the configured
//! remotes and create, edit, rename, copy or delete them.  Option values are
//! collected per the backend's declared schema — passwords can be typed or
//! generated and are always obscured before storage — and the backend's own
//! setup callback runs after the declared options are set.  Every completed
//! mutation is persisted immediately.
//!
//! The same building blocks back the non-interactive `create` / `update` /
//! `password` subcommands.

use std::io::Write;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::error;

use skiff_config::{
    Backend, BackendOption, CONFIG_AUTOMATIC, ConfigError, Obscure, OptionExample, Registry,
    Result, Session, crypto, is_drive_letter, is_valid_remote_name,
};

use crate::password;
use crate::prompt::Console;

// ---------------------------------------------------------------------------
// Browse loop
// ---------------------------------------------------------------------------

/// Top-level editor: list remotes and dispatch on the chosen action until
/// the user quits.
pub fn edit_loop(
    session: &mut Session,
    registry: &Registry,
    obscurer: &dyn Obscure,
    console: &mut Console,
) -> Result<()> {
    loop {
        let have_remotes = !session.section_list().is_empty();
        let what: &[&str] = if have_remotes {
            writeln!(console.output, "Current remotes:\n")?;
            show_remotes(session, console)?;
            writeln!(console.output)?;
            &[
                "eEdit existing remote",
                "nNew remote",
                "dDelete remote",
                "rRename remote",
                "cCopy remote",
                "sSet configuration password",
                "qQuit config",
            ]
        } else {
            writeln!(console.output, "No remotes found - make a new one")?;
            &["nNew remote", "sSet configuration password", "qQuit config"]
        };
        match console.command(what)? {
            'e' => {
                let name = choose_remote(session, console)?;
                edit_remote(session, registry, obscurer, console, &name)?;
            }
            'n' => {
                let name = new_remote_name(console)?;
                new_remote(session, registry, obscurer, console, &name)?;
            }
            'd' => {
                let name = choose_remote(session, console)?;
                delete_remote(session, &name)?;
            }
            'r' => {
                let name = choose_remote(session, console)?;
                rename_remote(session, console, &name)?;
            }
            'c' => {
                let name = choose_remote(session, console)?;
                copy_remote(session, console, &name)?;
            }
            's' => password::password_menu(session, console)?,
            'q' => return Ok(()),
            _ => {}
        }
    }
}

/// Pick one of the configured remotes.
fn choose_remote(session: &Session, console: &mut Console) -> Result<String> {
    let mut remotes = session.section_list();
    remotes.sort();
    console.choose("remote", &remotes, None, false)
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// Print the name/type table of all configured remotes.
pub fn show_remotes(session: &Session, console: &mut Console) -> Result<()> {
    let mut remotes = session.section_list();
    if remotes.is_empty() {
        return Ok(());
    }
    remotes.sort();
    writeln!(console.output, "{:<20} {}", "Name", "Type")?;
    writeln!(console.output, "{:<20} {}", "====", "====")?;
    for remote in remotes {
        writeln!(console.output, "{:<20} {}", remote, session.get_or(&remote, "type", ""))?;
    }
    Ok(())
}

/// Print the contents of one remote, masking password-typed values.
pub fn show_remote(
    session: &Session,
    registry: &Registry,
    console: &mut Console,
    name: &str,
) -> Result<()> {
    let backend = registry.find(&session.get_or(name, "type", ""));
    writeln!(console.output, "--------------------")?;
    writeln!(console.output, "[{name}]")?;
    for key in session.key_list(name) {
        let is_password = backend
            .map(|b| b.options.iter().any(|o| o.name == key && o.is_password))
            .unwrap_or(false);
        let value = session.get_or(name, &key, "");
        if is_password && !value.is_empty() {
            writeln!(console.output, "{key} = *** ENCRYPTED ***")?;
        } else {
            writeln!(console.output, "{key} = {value}")?;
        }
    }
    writeln!(console.output, "--------------------")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Option prompting
// ---------------------------------------------------------------------------

/// Collect a value for one declared option.
///
/// Password options offer typing one in, generating a random one of a chosen
/// bit strength, or (when optional) leaving it blank; the result is obscured
/// before it is returned.  Options with examples become a numbered chooser
/// that also accepts free input; anything else reads a single line.
pub fn choose_option(
    option: &BackendOption,
    console: &mut Console,
    obscurer: &dyn Obscure,
    auto_confirm: bool,
) -> Result<String> {
    writeln!(console.output, "{}", option.help)?;
    if option.is_password {
        let mut actions = vec!["yYes type in my own password", "gGenerate random password"];
        if option.optional {
            actions.push("nNo leave this optional password blank");
        }
        let value = match console.command(&actions)? {
            'y' => password::change_password(console, "the")?,
            'g' => generate_password(console, auto_confirm)?,
            'n' => return Ok(String::new()),
            choice => {
                error!(%choice, "bad choice");
                String::new()
            }
        };
        return obscurer.obscure(&value);
    }
    if !option.examples.is_empty() {
        let values: Vec<String> = option.examples.iter().map(|e| e.value.clone()).collect();
        let help: Vec<String> = option.examples.iter().map(|e| e.help.clone()).collect();
        return console.choose(&option.name, &values, Some(&help), true);
    }
    console.prompt_line(&format!("{}> ", option.name))
}

/// Generate a random password of a user-chosen bit strength.
fn generate_password(console: &mut Console, auto_confirm: bool) -> Result<String> {
    loop {
        writeln!(
            console.output,
            "Password strength in bits.\n64 is just about memorable\n128 is secure\n1024 is the maximum"
        )?;
        let bits = console.choose_number("Bits", 64, 1024)?;
        let bytes = (bits as usize).div_ceil(8);
        let password = URL_SAFE_NO_PAD.encode(crypto::random_bytes(bytes)?);
        writeln!(console.output, "Your password is: {password}")?;
        writeln!(console.output, "Use this password?")?;
        if console.confirm(auto_confirm)? {
            return Ok(password);
        }
    }
}

// ---------------------------------------------------------------------------
// Create / edit / confirm
// ---------------------------------------------------------------------------

/// Synthetic option presenting the registry as a chooser.
fn type_option(registry: &Registry) -> BackendOption {
    let mut examples: Vec<OptionExample> = registry
        .backends()
        .iter()
        .map(|b| OptionExample {
            value: b.name.clone(),
            help: b.description.clone(),
        })
        .collect();
    examples.sort_by(|a, b| a.value.cmp(&b.value));
    let mut option = BackendOption::new("Storage", "Type of storage to configure.");
    option.examples = examples;
    option
}

/// Find the backend for an already-typed remote.
fn backend_by_name<'r>(
    session: &Session,
    registry: &'r Registry,
    name: &str,
) -> Result<&'r Backend> {
    let backend_type = session.get_or(name, "type", "");
    if backend_type.is_empty() {
        return Err(ConfigError::Validation(format!(
            "couldn't find type of remote {name:?}"
        )));
    }
    registry.find(&backend_type).ok_or_else(|| {
        ConfigError::Validation(format!("unknown backend type {backend_type:?}"))
    })
}

/// Run the backend's own setup callback, if it declares one.
pub fn remote_config(session: &mut Session, registry: &Registry, name: &str) -> Result<()> {
    let backend = backend_by_name(session, registry, name)?;
    if let Some(setup) = backend.setup {
        setup(session, name)?;
    }
    Ok(())
}

/// Show the assembled remote and ask to accept, edit or delete it.
/// Returns `true` when the remote is settled (accepted or deleted).
fn ok_remote(
    session: &mut Session,
    registry: &Registry,
    console: &mut Console,
    name: &str,
) -> Result<bool> {
    show_remote(session, registry, console, name)?;
    match console.command(&[
        "yYes this is OK",
        "eEdit this remote",
        "dDelete this remote",
    ])? {
        'y' => Ok(true),
        'e' => Ok(false),
        'd' => {
            session.delete_section(name);
            Ok(true)
        }
        choice => {
            error!(%choice, "bad choice");
            Ok(false)
        }
    }
}

/// Ask for a new remote name until it passes validation.
pub fn new_remote_name(console: &mut Console) -> Result<String> {
    loop {
        let name = console.prompt_line("name> ")?;
        if name.is_empty() {
            writeln!(console.output, "Can't use empty name.")?;
        } else if is_drive_letter(&name) {
            writeln!(console.output, "Can't use {name:?} as it can be confused with a drive letter.")?;
        } else if !is_valid_remote_name(&name) {
            writeln!(console.output, "Can't use {name:?} as it has invalid characters in it.")?;
        } else {
            return Ok(name);
        }
    }
}

/// Interactively build a new remote under `name`: choose the type, collect
/// each declared option, run the backend setup, then confirm.
pub fn new_remote(
    session: &mut Session,
    registry: &Registry,
    obscurer: &dyn Obscure,
    console: &mut Console,
    name: &str,
) -> Result<()> {
    let new_type = choose_option(&type_option(registry), console, obscurer, session.auto_confirm)?;
    session.set(name, "type", &new_type);
    let backend = registry.find(&new_type).ok_or_else(|| {
        ConfigError::Validation(format!("unknown backend type {new_type:?}"))
    })?;
    for option in &backend.options {
        let value = choose_option(option, console, obscurer, session.auto_confirm)?;
        session.set(name, &option.name, &value);
    }
    remote_config(session, registry, name)?;
    if ok_remote(session, registry, console, name)? {
        session.save()?;
        return Ok(());
    }
    edit_remote(session, registry, obscurer, console, name)
}

/// Walk an existing remote's options, re-prompting for any the user wants to
/// change, until the result is confirmed.
pub fn edit_remote(
    session: &mut Session,
    registry: &Registry,
    obscurer: &dyn Obscure,
    console: &mut Console,
    name: &str,
) -> Result<()> {
    let backend = backend_by_name(session, registry, name)?;
    show_remote(session, registry, console, name)?;
    writeln!(console.output, "Edit remote")?;
    loop {
        for option in &backend.options {
            let value = session.get_or(name, &option.name, "");
            writeln!(console.output, "Value {:?} = {:?}", option.name, value)?;
            writeln!(console.output, "Edit? (y/n)>")?;
            if console.confirm(session.auto_confirm)? {
                let new_value = choose_option(option, console, obscurer, session.auto_confirm)?;
                session.set(name, &option.name, &new_value);
            }
        }
        if ok_remote(session, registry, console, name)? {
            break;
        }
    }
    session.save()?;
    // The confirm screen may have deleted the remote; nothing left to set up.
    if !session.has_section(name) {
        return Ok(());
    }
    remote_config(session, registry, name)
}

// ---------------------------------------------------------------------------
// Delete / rename / copy
// ---------------------------------------------------------------------------

/// Drop a remote and persist immediately.
pub fn delete_remote(session: &mut Session, name: &str) -> Result<()> {
    session.delete_section(name);
    session.save()
}

/// Ask for a new name and duplicate all keys of `name` under it.
/// Returns the new name.
fn duplicate_remote(session: &mut Session, console: &mut Console, name: &str) -> Result<String> {
    let new_name = new_remote_name(console)?;
    for key in session.key_list(name) {
        let value = session.get_or(name, &key, "");
        session.set(&new_name, &key, &value);
    }
    Ok(new_name)
}

/// Rename a remote: copy under the new name, then delete the source.
pub fn rename_remote(session: &mut Session, console: &mut Console, name: &str) -> Result<()> {
    writeln!(console.output, "Enter new name for {name:?} remote.")?;
    let new_name = duplicate_remote(session, console, name)?;
    if name != new_name {
        session.delete_section(name);
        session.save()?;
    }
    Ok(())
}

/// Copy a remote under a new name.
pub fn copy_remote(session: &mut Session, console: &mut Console, name: &str) -> Result<()> {
    writeln!(console.output, "Enter name for copy of {name:?} remote.")?;
    duplicate_remote(session, console, name)?;
    session.save()
}

// ---------------------------------------------------------------------------
// Non-interactive operations
// ---------------------------------------------------------------------------

/// Create a remote from supplied key-value pairs, replacing any existing
/// section of the same name and marking it automatically configured.
pub fn create_remote(
    session: &mut Session,
    registry: &Registry,
    console: &mut Console,
    name: &str,
    backend_type: &str,
    key_values: &[String],
) -> Result<()> {
    session.auto_confirm = true;
    session.delete_section(name);
    session.set(name, "type", backend_type);
    session.set(name, CONFIG_AUTOMATIC, "yes");
    update_remote(session, registry, console, name, key_values)
}

/// Apply key-value pairs to an existing remote, run the backend setup, show
/// the result and persist.
pub fn update_remote(
    session: &mut Session,
    registry: &Registry,
    console: &mut Console,
    name: &str,
    key_values: &[String],
) -> Result<()> {
    if key_values.len() % 2 != 0 {
        return Err(ConfigError::Validation("found key without value".into()));
    }
    for pair in key_values.chunks(2) {
        session.set(name, &pair[0], &pair[1]);
    }
    remote_config(session, registry, name)?;
    show_remote(session, registry, console, name)?;
    session.save()
}

/// Store one obscured password value in a remote.
pub fn password_remote(
    session: &mut Session,
    registry: &Registry,
    obscurer: &dyn Obscure,
    console: &mut Console,
    name: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    session.auto_confirm = true;
    let obscured = obscurer.obscure(value)?;
    if obscured.is_empty() {
        return Ok(());
    }
    session.set(name, key, &obscured);
    remote_config(session, registry, name)?;
    show_remote(session, registry, console, name)?;
    session.save()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use skiff_config::BuiltinObscurer;

    fn test_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(Backend {
            name: "local".into(),
            description: "Local filesystem".into(),
            options: vec![],
            setup: None,
        });
        registry.register(Backend {
            name: "sftp".into(),
            description: "SSH connection".into(),
            options: vec![
                BackendOption::new("host", "Host to connect to"),
                BackendOption::new("pass", "Password for the host").password().optional(),
            ],
            setup: Some(|session, name| {
                session.set(name, "configured", "true");
                Ok(())
            }),
        });
        registry
    }

    fn session_in(dir: &tempfile::TempDir) -> Session {
        Session::new(dir.path().join("skiff.conf"))
    }

    fn drive(
        session: &mut Session,
        registry: &Registry,
        input: &str,
        f: impl FnOnce(&mut Session, &Registry, &dyn Obscure, &mut Console) -> Result<()>,
    ) -> String {
        let mut input = Cursor::new(input.to_string());
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);
        f(session, registry, &BuiltinObscurer, &mut console).expect("workflow should succeed");
        String::from_utf8(output).expect("output is UTF-8")
    }

    #[test]
    fn new_remote_full_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let registry = test_registry();

        // name, type by number (local=1, sftp=2 sorted), host, password
        // blank, accept, quit.
        let input = "n\nbackup\n2\nexample.com\nn\ny\nq\n";
        let output = drive(&mut session, &registry, input, |s, r, o, c| {
            edit_loop(s, r, o, c)
        });

        assert!(output.contains("No remotes found - make a new one"));
        assert_eq!(session.get("backup", "type").as_deref(), Some("sftp"));
        assert_eq!(session.get("backup", "host").as_deref(), Some("example.com"));
        assert_eq!(session.get("backup", "pass").as_deref(), Some(""));
        // The setup callback ran.
        assert_eq!(session.get("backup", "configured").as_deref(), Some("true"));
        // Persisted.
        assert!(session.path().exists());
    }

    #[test]
    fn new_remote_name_rejects_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let registry = test_registry();
        session.set("keep", "type", "local");

        let input = "r\n1\n\nC\nbad name\nrenamed\nq\n";
        let output = drive(&mut session, &registry, input, |s, r, o, c| {
            edit_loop(s, r, o, c)
        });

        assert!(output.contains("Can't use empty name."));
        assert!(output.contains("drive letter"));
        assert!(output.contains("invalid characters"));
        assert!(session.has_section("renamed"));
        assert!(!session.has_section("keep"));
    }

    #[test]
    fn rename_keeps_keys_and_drops_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.set("r1", "type", "local");
        session.set("r1", "x", "1");

        let mut input = Cursor::new(String::from("r2\n"));
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);
        rename_remote(&mut session, &mut console, "r1").unwrap();

        assert!(!session.has_section("r1"));
        assert_eq!(session.get("r2", "x").as_deref(), Some("1"));
        assert_eq!(session.get("r2", "type").as_deref(), Some("local"));
    }

    #[test]
    fn copy_keeps_both() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.set("r1", "type", "local");
        session.set("r1", "x", "1");

        let mut input = Cursor::new(String::from("r2\n"));
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);
        copy_remote(&mut session, &mut console, "r1").unwrap();

        assert_eq!(session.get("r1", "x").as_deref(), Some("1"));
        assert_eq!(session.get("r2", "x").as_deref(), Some("1"));
    }

    #[test]
    fn delete_remote_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.set("gone", "type", "local");
        session.save().unwrap();

        delete_remote(&mut session, "gone").unwrap();

        assert!(!session.has_section("gone"));
        let text = std::fs::read_to_string(session.path()).unwrap();
        assert!(!text.contains("[gone]"));
    }

    #[test]
    fn create_remote_replaces_and_marks_automatic() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let registry = test_registry();
        session.set("r1", "stale", "yes");

        let pairs = vec!["x".to_string(), "1".to_string()];
        let mut input = Cursor::new(String::new());
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);
        create_remote(&mut session, &registry, &mut console, "r1", "sftp", &pairs).unwrap();

        assert_eq!(session.get("r1", "stale"), None);
        assert_eq!(session.get("r1", "type").as_deref(), Some("sftp"));
        assert_eq!(session.get("r1", CONFIG_AUTOMATIC).as_deref(), Some("yes"));
        assert_eq!(session.get("r1", "x").as_deref(), Some("1"));
        assert_eq!(session.get("r1", "configured").as_deref(), Some("true"));
    }

    #[test]
    fn update_remote_rejects_odd_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let registry = test_registry();
        session.set("r1", "type", "local");

        let pairs = vec!["key-without-value".to_string()];
        let mut input = Cursor::new(String::new());
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);
        let result = update_remote(&mut session, &registry, &mut console, "r1", &pairs);

        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert_eq!(session.get("r1", "key-without-value"), None);
    }

    #[test]
    fn password_remote_stores_obscured_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let registry = test_registry();
        session.set("r1", "type", "sftp");

        let mut input = Cursor::new(String::new());
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);
        password_remote(
            &mut session,
            &registry,
            &BuiltinObscurer,
            &mut console,
            "r1",
            "pass",
            "hunter2",
        )
        .unwrap();

        let stored = session.get("r1", "pass").unwrap();
        assert_ne!(stored, "hunter2");
        assert_eq!(BuiltinObscurer.reveal(&stored).unwrap(), "hunter2");
    }

    #[test]
    fn choose_option_password_typed_in() {
        let mut input = Cursor::new(String::from("y\nhunter2\nhunter2\n"));
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);

        let option = BackendOption::new("pass", "Password for the host").password();
        let stored = choose_option(&option, &mut console, &BuiltinObscurer, false).unwrap();

        assert_eq!(BuiltinObscurer.reveal(&stored).unwrap(), "hunter2");
    }

    #[test]
    fn choose_option_password_generated() {
        let mut input = Cursor::new(String::from("g\n128\ny\n"));
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);

        let option = BackendOption::new("pass", "Password for the host").password();
        let stored = choose_option(&option, &mut console, &BuiltinObscurer, false).unwrap();

        let generated = BuiltinObscurer.reveal(&stored).unwrap();
        // 128 bits → 16 random bytes, base64-url without padding.
        let raw = URL_SAFE_NO_PAD.decode(generated.as_bytes()).unwrap();
        assert_eq!(raw.len(), 16);
        let out = String::from_utf8(output).unwrap();
        assert!(out.contains("Password strength in bits."));
        assert!(out.contains("Your password is:"));
    }

    #[test]
    fn choose_option_optional_password_blank() {
        let mut input = Cursor::new(String::from("n\n"));
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);

        let option = BackendOption::new("pass", "Password for the host")
            .password()
            .optional();
        let value = choose_option(&option, &mut console, &BuiltinObscurer, false).unwrap();
        assert_eq!(value, "");
    }

    #[test]
    fn choose_option_examples_allow_own_value() {
        let mut input = Cursor::new(String::from("my-own\n"));
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);

        let option = BackendOption::new("provider", "Storage provider")
            .with_examples(&[("aws", "Amazon Web Services"), ("gcs", "Google Cloud Storage")]);
        let value = choose_option(&option, &mut console, &BuiltinObscurer, false).unwrap();
        assert_eq!(value, "my-own");
    }

    #[test]
    fn show_remote_masks_passwords() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let registry = test_registry();
        session.set("r1", "type", "sftp");
        session.set("r1", "host", "example.com");
        session.set("r1", "pass", "obscured-blob");

        let mut input = Cursor::new(String::new());
        let mut output = Vec::new();
        let mut console = Console::scripted(&mut input, &mut output);
        show_remote(&session, &registry, &mut console, "r1").unwrap();

        let out = String::from_utf8(output).unwrap();
        assert!(out.contains("host = example.com"));
        assert!(out.contains("pass = *** ENCRYPTED ***"));
        assert!(!out.contains("obscured-blob"));
    }

    #[test]
    fn edit_remote_changes_single_option() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let registry = test_registry();
        session.set("r1", "type", "sftp");
        session.set("r1", "host", "old.example.com");
        session.set("r1", "pass", "");

        // edit host → new value, skip pass, accept.
        let input = "y\nnew.example.com\nn\ny\n";
        drive(&mut session, &registry, input, |s, r, o, c| {
            edit_remote(s, r, o, c, "r1")
        });

        assert_eq!(session.get("r1", "host").as_deref(), Some("new.example.com"));
        assert!(session.path().exists());
    }

    #[test]
    fn confirm_delete_drops_remote() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        let registry = test_registry();
        session.set("doomed", "type", "local");

        // New-remote confirm screen offers delete; driving edit_remote for a
        // backend with no options goes straight to the confirm prompt.
        let input = "d\n";
        drive(&mut session, &registry, input, |s, r, o, c| {
            edit_remote(s, r, o, c, "doomed")
        });

        assert!(!session.has_section("doomed"));
    }
}
