//! Delivery of resolved secret values to their destinations

use crate::reference::Destination;
use getsecret_core::{Error, Result};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Collects environment deliveries and performs file deliveries
#[derive(Debug, Default)]
pub struct DestinationSink {
    env: HashMap<String, String>,
}

impl DestinationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one value.
    ///
    /// Environment values are only recorded; files are written immediately.
    pub fn deliver(&mut self, destination: &Destination, value: Vec<u8>) -> Result<()> {
        match destination {
            Destination::Env { name } => {
                let value = String::from_utf8(value).map_err(|_| {
                    Error::delivery(
                        format!("environment variable {name}"),
                        "value is not valid UTF-8",
                    )
                })?;
                self.env.insert(name.clone(), value);
                Ok(())
            }
            Destination::File { path, mode } => write_file(path, *mode, &value),
        }
    }

    /// Values recorded for environment destinations, keyed by variable name
    #[must_use]
    pub fn env_overrides(&self) -> &HashMap<String, String> {
        &self.env
    }
}

/// Resolve `path` against the current directory
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Error::file_system(path, "determine absolute path", e))?;
    Ok(cwd.join(path))
}

/// Create or truncate `path`, write `value` and apply `mode` when non-zero.
///
/// Missing parent directories are created.
pub fn write_file(path: &Path, mode: u32, value: &[u8]) -> Result<()> {
    let path = absolute_path(path)?;

    if let Some(parent) = path.parent() {
        create_dir_all(parent)
            .map_err(|e| Error::file_system(parent, "create directory", e))?;
    }

    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);
    // New files never exist with wider permissions than requested
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if mode != 0 {
            options.mode(mode);
        }
    }

    let mut file = options
        .open(&path)
        .map_err(|e| Error::file_system(&path, "open", e))?;
    file.write_all(value)
        .map_err(|e| Error::file_system(&path, "write", e))?;
    file.sync_all()
        .map_err(|e| Error::file_system(&path, "close", e))?;
    drop(file);

    if mode != 0 {
        set_mode(&path, mode).map_err(|e| Error::file_system(&path, "chmod", e))?;
    }

    tracing::debug!(path = %path.display(), bytes = value.len(), "wrote secret file");
    Ok(())
}

#[cfg(unix)]
fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    // Only the owner-write bit has a Windows equivalent
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}
