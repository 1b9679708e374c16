//! Store-encryption workflow.
//!
//! Two states, keyed off whether the session currently holds a key:
//! an unencrypted store offers adding a password, an encrypted one offers
//! changing it or removing encryption.  Every transition re-persists the
//! store immediately so the on-disk state always matches the menu shown.

use std::io::Write;

use skiff_config::{Result, Session, crypto};

use crate::prompt::Console;

/// Ask for a passphrase until it passes validation.
pub fn get_password(console: &mut Console, prompt: &str) -> Result<String> {
    loop {
        let password = console.read_secret(prompt)?;
        match crypto::check_password(&password) {
            Ok(password) => return Ok(password),
            Err(e) => writeln!(console.output, "Bad password: {e}")?,
        }
    }
}

/// Ask for the named password twice; loops until both entries match.
pub fn change_password(console: &mut Console, name: &str) -> Result<String> {
    loop {
        let first = get_password(console, &format!("Enter {name} password:"))?;
        let second = get_password(console, &format!("Confirm {name} password:"))?;
        if first == second {
            return Ok(first);
        }
        writeln!(console.output, "Passwords do not match!")?;
    }
}

/// Set the store key from a freshly confirmed passphrase.
fn change_config_password(session: &mut Session, console: &mut Console) -> Result<()> {
    let password = change_password(console, "NEW configuration")?;
    if let Err(e) = session.set_password(&password) {
        writeln!(console.output, "Failed to set config password: {e}")?;
    }
    Ok(())
}

/// The password menu: add, change or remove store encryption.
pub fn password_menu(session: &mut Session, console: &mut Console) -> Result<()> {
    loop {
        if session.is_encrypted() {
            writeln!(console.output, "Your configuration is encrypted.")?;
            let what = &["cChange Password", "uUnencrypt configuration", "qQuit to main menu"];
            match console.command(what)? {
                'c' => {
                    change_config_password(session, console)?;
                    session.save()?;
                    writeln!(console.output, "Password changed")?;
                }
                'u' => {
                    session.clear_password();
                    session.save()?;
                }
                'q' => return Ok(()),
                _ => {}
            }
        } else {
            writeln!(console.output, "Your configuration is not encrypted.")?;
            writeln!(
                console.output,
                "If you add a password, you will protect your login information to storage backends."
            )?;
            let what = &["aAdd Password", "qQuit to main menu"];
            match console.command(what)? {
                'a' => {
                    change_config_password(session, console)?;
                    session.save()?;
                    writeln!(console.output, "Password set")?;
                }
                'q' => return Ok(()),
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
