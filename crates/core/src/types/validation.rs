//! Validation of AWS identifiers supplied through configuration
//!
//! Limits follow the STS `AssumeRole` API reference.

use crate::errors::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static SESSION_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_+=,.@-]+$").expect("session name pattern is valid")
});

const SESSION_NAME_MIN: usize = 2;
const SESSION_NAME_MAX: usize = 64;
const ARN_MIN: usize = 20;
const ARN_MAX: usize = 2048;

/// Check a role session name against the STS constraints
pub fn validate_session_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(SESSION_NAME_MIN..=SESSION_NAME_MAX).contains(&len) {
        return Err(Error::configuration(format!(
            "session name length must be between {SESSION_NAME_MIN} and {SESSION_NAME_MAX}, got {len}"
        )));
    }
    if !SESSION_NAME_REGEX.is_match(name) {
        return Err(Error::configuration(format!(
            "session name '{name}' must match [\\w+=,.@-]*"
        )));
    }
    Ok(())
}

/// Check a role ARN against the STS constraints
pub fn validate_arn(arn: &str) -> Result<()> {
    let len = arn.chars().count();
    if !(ARN_MIN..=ARN_MAX).contains(&len) {
        return Err(Error::configuration(format!(
            "role ARN length must be between {ARN_MIN} and {ARN_MAX}, got {len}"
        )));
    }
    if let Some(bad) = arn.chars().find(|c| !is_arn_char(*c)) {
        return Err(Error::configuration(format!(
            "role ARN contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

fn is_arn_char(c: char) -> bool {
    matches!(c,
        '\u{0009}' | '\u{000A}' | '\u{000D}'
        | '\u{0020}'..='\u{007E}'
        | '\u{0085}'
        | '\u{00A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
