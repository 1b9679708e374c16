//! Crash-safe atomic rewrite of the config file.
//!
//! The serialized store is written to a temporary file in the same directory
//! as the target (same-directory keeps the final rename on one filesystem),
//! permissions are carried over from the previous file, then the previous
//! file is parked at a `.old` suffix while the temp file is renamed into
//! place, and the backup is removed.  A crash between the two renames leaves
//! the `.old` backup behind; that window is a single rename and is accepted.
//!
//! The temporary file is removed on every failure path.  Any error here is
//! fatal to the calling operation — after the rename sequence starts the
//! on-disk state cannot be retried safely.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// Default permission bits for a config file created from scratch.
#[cfg(unix)]
const DEFAULT_MODE: u32 = 0o600;

/// Atomically replace `path` with `bytes`, keeping one `.old` backup during
/// the swap.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".skiff-conf-")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;

    apply_metadata(path, tmp.path());

    let backup = backup_path(path);
    match std::fs::rename(path, &backup) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    tmp.persist(path).map_err(|e| e.error)?;

    match std::fs::remove_file(&backup) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %backup.display(), error = %e, "failed to remove backup config file"),
    }

    debug!(path = %path.display(), "config file written");
    Ok(())
}

/// Path of the single-generation backup kept during the swap.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".old");
    PathBuf::from(os)
}

/// Carry permission bits and group ownership from the previous file over to
/// the temp file.  Mode falls back to a private default for a fresh file;
/// the group copy is best-effort.
#[cfg(unix)]
fn apply_metadata(path: &Path, tmp: &Path) {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    let mut mode = DEFAULT_MODE;
    match std::fs::metadata(path) {
        Ok(meta) => {
            let previous = meta.permissions().mode() & 0o777;
            if previous != mode {
                debug!("keeping previous permissions for config file: {previous:o}");
                mode = previous;
            }
            if let Err(e) = std::os::unix::fs::chown(tmp, None, Some(meta.gid())) {
                debug!(error = %e, "failed to copy group ownership to new config file");
            }
        }
        Err(_) => {
            debug!("using default permissions for config file: {mode:o}");
        }
    }

    if let Err(e) = std::fs::set_permissions(tmp, std::fs::Permissions::from_mode(mode)) {
        warn!(error = %e, "failed to set permissions on config file");
    }
}

#[cfg(not(unix))]
fn apply_metadata(_path: &Path, _tmp: &Path) {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
