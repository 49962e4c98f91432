use super::resolve_program;
use getsecret_core::{EnvironmentImage, Error, Result};
use std::os::unix::process::CommandExt;
use std::process::Command;

/// Replace the current process with `command`.
///
/// Returns only when the replacement failed.
pub async fn launch(command: &str, args: &[String], env: &EnvironmentImage) -> Result<i32> {
    let program = resolve_program(command, args)?;
    tracing::debug!(program = %program.display(), "replacing process");

    let mut cmd = Command::new(&program);
    cmd.arg0(command).args(args).env_clear();
    for (name, value) in env.pairs().filter(|(name, _)| !name.is_empty()) {
        cmd.env(name, value);
    }

    let err = cmd.exec();
    Err(Error::command_execution(
        command,
        args.to_vec(),
        err.to_string(),
        None,
    ))
}
