/// Handing the process over to the wrapped command
///
/// Unix replaces the current process image; Windows has no `exec`, so the
/// command runs as a child and its exit code is passed through.
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::launch;
#[cfg(windows)]
pub use windows::launch;

use getsecret_core::{Error, Result};
use std::path::PathBuf;

/// Find `command` on `PATH`
pub fn resolve_program(command: &str, args: &[String]) -> Result<PathBuf> {
    which::which(command).map_err(|e| {
        Error::command_execution(
            command,
            args.to_vec(),
            format!("could not find program {command} on path, {e}"),
            None,
        )
    })
}
