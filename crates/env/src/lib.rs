//! Secret reference resolution for aws-get-secret
//!
//! This crate turns `aws:///...` references found in an environment into
//! resolved values: it parses the references, fetches the secrets from a
//! [`SecretBackend`](getsecret_core::SecretBackend), applies defaults and
//! templates, and delivers the results to environment variables or files.

pub mod reference;
pub mod resolver;
pub mod sink;
pub mod template;
pub mod transform;

pub use reference::{
    is_reference, parse, parse_environment, Destination, ParseContext, SecretReference,
};
pub use resolver::{ResolveOptions, SecretInjector};
pub use sink::{write_file, DestinationSink};
pub use template::{Template, TemplateError};
pub use transform::transform;
