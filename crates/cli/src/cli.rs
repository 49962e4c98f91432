use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use getsecret_core::{
    DEFAULT_REGION, DEFAULT_SESSION_NAME, DEFAULT_TIMEOUT_MS, REGION_VAR, ROLE_VAR,
    SESSION_NAME_VAR, TIMEOUT_VAR, VERBOSE_VAR,
};

#[derive(Parser, Debug)]
#[command(name = "aws-get-secret")]
#[command(
    about = "Replace aws:/// references in the environment with AWS Secrets Manager values, then run COMMAND",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// The AWS region to use
    #[arg(short, long, env = REGION_VAR, default_value = DEFAULT_REGION)]
    pub region: String,

    /// ARN of the role to assume for secret access
    #[arg(short = 'a', long = "role", env = ROLE_VAR)]
    pub role_arn: Option<String>,

    /// Time allowed for all AWS calls, in milliseconds
    #[arg(short, long, env = TIMEOUT_VAR, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Session name used when assuming the role
    #[arg(short = 'n', long, env = SESSION_NAME_VAR, default_value = DEFAULT_SESSION_NAME)]
    pub session_name: String,

    /// Turn on verbose output
    #[arg(
        short,
        long,
        env = VERBOSE_VAR,
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub verbose: bool,

    /// Command to run once secrets are resolved (`noop` to only resolve)
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}
