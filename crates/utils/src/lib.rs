//! Shared utilities for aws-get-secret

pub mod tracing;

pub use self::tracing::init as init_tracing;
