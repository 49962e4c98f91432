//! The invocation flow: resolve secrets, then hand over to the command

use crate::platform;
use crate::settings::Settings;
use getsecret_aws::{AwsBackend, AwsConfig};
use getsecret_core::{EnvironmentImage, Result, SecretBackend};
use getsecret_env::{ResolveOptions, SecretInjector};
use std::sync::Arc;

/// What to do once secrets are resolved
#[derive(Debug)]
pub enum Launch {
    /// `noop`: nothing to run
    Noop,
    Command {
        program: String,
        args: Vec<String>,
        env: EnvironmentImage,
    },
}

/// Resolve every reference in `env` and decide what to launch
pub async fn prepare(
    settings: &Settings,
    backend: Arc<dyn SecretBackend>,
    env: &EnvironmentImage,
) -> Result<Launch> {
    let env = SecretInjector::new(backend)
        .with_options(ResolveOptions {
            verbose: settings.verbose,
        })
        .resolve(env)
        .await?;

    if settings.is_noop() {
        tracing::info!("noop");
        return Ok(Launch::Noop);
    }

    Ok(Launch::Command {
        program: settings.command.clone(),
        args: settings.args.clone(),
        env,
    })
}

/// Run one invocation against AWS and return the exit code.
///
/// On Unix a successful launch replaces this process and never returns.
pub async fn run(settings: Settings) -> Result<i32> {
    let config = AwsConfig::new(settings.region.as_str(), settings.timeout)
        .with_role(settings.role_arn.clone())
        .with_session_name(settings.session_name.as_str());
    let backend = Arc::new(AwsBackend::load(config).await);

    match prepare(&settings, backend, &EnvironmentImage::from_process()).await? {
        Launch::Noop => Ok(0),
        Launch::Command { program, args, env } => platform::launch(&program, &args, &env).await,
    }
}
