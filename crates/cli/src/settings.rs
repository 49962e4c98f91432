//! Validated configuration for one invocation

use crate::cli::Cli;
use getsecret_core::{validate_arn, validate_session_name, Error, Result, NOOP_COMMAND};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub region: String,
    pub role_arn: Option<String>,
    pub timeout: Duration,
    pub session_name: String,
    pub verbose: bool,
    pub command: String,
    pub args: Vec<String>,
}

impl Settings {
    /// Whether the command only asks for secrets to be resolved
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.command == NOOP_COMMAND && self.args.is_empty()
    }
}

impl TryFrom<Cli> for Settings {
    type Error = Error;

    fn try_from(cli: Cli) -> Result<Self> {
        if cli.region.is_empty() {
            return Err(Error::configuration("you must supply a valid region with -r REGION"));
        }
        validate_session_name(&cli.session_name)?;

        let role_arn = cli.role_arn.filter(|arn| !arn.is_empty());
        if let Some(arn) = &role_arn {
            validate_arn(arn)?;
        }

        let mut command = cli.command.into_iter();
        let Some(program) = command.next().filter(|program| !program.is_empty()) else {
            return Err(Error::configuration(
                "you must supply a command to run, for example: aws-get-secret -- echo $SECRET",
            ));
        };

        Ok(Self {
            region: cli.region,
            role_arn,
            timeout: Duration::from_millis(cli.timeout),
            session_name: cli.session_name,
            verbose: cli.verbose,
            command: program,
            args: command.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn settings(args: &[&str]) -> Result<Settings> {
        let mut argv = vec!["aws-get-secret"];
        argv.extend_from_slice(args);
        Settings::try_from(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_valid_settings() {
        let settings = settings(&["-t", "1500", "env", "-0"]).unwrap();
        assert_eq!(settings.timeout, Duration::from_millis(1500));
        assert_eq!(settings.command, "env");
        assert_eq!(settings.args, vec!["-0"]);
        assert_eq!(settings.role_arn, None);
        assert!(!settings.is_noop());
    }

    #[test]
    fn test_noop() {
        assert!(settings(&["noop"]).unwrap().is_noop());
        assert!(!settings(&["noop", "extra"]).unwrap().is_noop());
    }

    #[test]
    fn test_empty_region_rejected() {
        let err = settings(&["-r", "", "env"]).unwrap_err();
        assert!(err.to_string().contains("region"), "{err}");
    }

    #[test]
    fn test_invalid_session_name_rejected() {
        assert!(settings(&["-n", "x", "env"]).is_err());
        assert!(settings(&["-n", "has space", "env"]).is_err());
        assert!(settings(&["-n", "", "env"]).is_err());
    }

    #[test]
    fn test_role_arn_validated() {
        assert!(settings(&["-a", "arn:short", "env"]).is_err());
        let settings = settings(&["-a", "arn:aws:iam::123456789012:role/reader", "env"]).unwrap();
        assert_eq!(
            settings.role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/reader")
        );
    }

    #[test]
    fn test_empty_role_means_none() {
        assert_eq!(settings(&["-a", "", "env"]).unwrap().role_arn, None);
    }
}
