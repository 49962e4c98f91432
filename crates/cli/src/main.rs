use aws_get_secret::{run, Cli, Settings};
use clap::Parser;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let settings = Settings::try_from(cli)?;

    if let Err(e) = getsecret_utils::init_tracing(settings.verbose) {
        eprintln!("failed to initialize logging: {e}");
    }

    let exit_code = run(settings).await?;
    std::process::exit(exit_code);
}
