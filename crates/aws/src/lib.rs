//! AWS backend for aws-get-secret
//!
//! Built on the AWS SDK. Base credentials come from the SDK's default
//! provider chain: environment variables, the shared config and credentials
//! files (profiles, `credential_process`, SSO), web identity tokens, the
//! container credentials endpoint and instance metadata. Only the two calls
//! the resolver needs are made, `AssumeRole` and `GetSecretValue`, and
//! retries are disabled.

pub mod client;
mod error;
pub mod secretsmanager;
pub mod sts;

pub use aws_sdk_secretsmanager::config::Credentials;
pub use client::{AwsBackend, AwsConfig};
