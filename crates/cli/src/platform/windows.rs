use super::resolve_program;
use getsecret_core::{EnvironmentImage, Error, Result};
use tokio::process::Command;

/// Run `command` as a child and return its exit code.
///
/// Ctrl-C reaches the child through the shared console, so it is ignored
/// here until the child exits.
pub async fn launch(command: &str, args: &[String], env: &EnvironmentImage) -> Result<i32> {
    let program = resolve_program(command, args)?;

    let mut child = Command::new(&program)
        .args(args)
        .env_clear()
        .envs(env.pairs().filter(|(name, _)| !name.is_empty()))
        .spawn()
        .map_err(|e| Error::command_execution(command, args.to_vec(), e.to_string(), None))?;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("received Ctrl-C, waiting for child");
            }
        }
    }
    .map_err(|e| Error::command_execution(command, args.to_vec(), e.to_string(), None))?;

    Ok(status.code().unwrap_or(1))
}
