//! Built-in backend registrations.
//!
//! The config store treats the registry as a collaborator; this module is
//! the host side of that seam, registering the backends this binary ships
//! with.  Each entry declares its option schema and, where needed, a setup
//! callback run after the declared options are collected.

use skiff_config::{Backend, BackendOption, Registry, Result, Session};

/// Registry of the backends compiled into this binary.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register(Backend {
        name: "local".into(),
        description: "Local filesystem".into(),
        options: vec![],
        setup: None,
    });

    registry.register(Backend {
        name: "sftp".into(),
        description: "SSH/SFTP connection".into(),
        options: vec![
            BackendOption::new("host", "SSH host to connect to"),
            BackendOption::new("user", "SSH username, leave blank for current user").optional(),
            BackendOption::new("port", "SSH port, leave blank to use default").optional(),
            BackendOption::new("pass", "SSH password, leave blank to use ssh-agent")
                .password()
                .optional(),
        ],
        setup: None,
    });

    registry.register(Backend {
        name: "bucket".into(),
        description: "Object storage bucket".into(),
        options: vec![
            BackendOption::new("provider", "Storage provider to connect to").with_examples(&[
                ("aws", "Amazon Web Services S3"),
                ("gcs", "Google Cloud Storage"),
                ("other", "Any other S3 compatible provider"),
            ]),
            BackendOption::new("access_key_id", "Access key ID, leave blank for anonymous access")
                .optional(),
            BackendOption::new("secret_access_key", "Secret access key")
                .password()
                .optional(),
        ],
        setup: Some(bucket_setup),
    });

    registry
}

/// Derive the endpoint from the chosen provider unless one was given
/// explicitly.
fn bucket_setup(session: &mut Session, name: &str) -> Result<()> {
    if session.get(name, "endpoint").is_some() {
        return Ok(());
    }
    let endpoint = match session.get_or(name, "provider", "").as_str() {
        "aws" => "s3.amazonaws.com",
        "gcs" => "storage.googleapis.com",
        _ => return Ok(()),
    };
    session.set(name, "endpoint", endpoint);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_expected_backends() {
        let registry = builtin_registry();
        assert!(registry.find("local").is_some());
        assert!(registry.find("sftp").is_some());
        assert!(registry.find("bucket").is_some());
        assert!(registry.find("carrier-pigeon").is_none());
    }

    #[test]
    fn sftp_password_option_is_flagged() {
        let registry = builtin_registry();
        let sftp = registry.find("sftp").unwrap();
        let pass = sftp.options.iter().find(|o| o.name == "pass").unwrap();
        assert!(pass.is_password);
        assert!(pass.optional);
    }

    #[test]
    fn bucket_setup_fills_known_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(dir.path().join("skiff.conf"));
        session.set("b", "type", "bucket");
        session.set("b", "provider", "aws");

        bucket_setup(&mut session, "b").unwrap();
        assert_eq!(session.get("b", "endpoint").as_deref(), Some("s3.amazonaws.com"));

        // Unknown providers are left alone.
        let mut other = Session::new(dir.path().join("other.conf"));
        other.set("b", "provider", "other");
        bucket_setup(&mut other, "b").unwrap();
        assert_eq!(other.get("b", "endpoint"), None);
    }
}
