//! Core domain types for `aws-get-secret`.
//!
//! - **`environment`**: the ordered Environment Image handed to the child
//! - **`backend`**: the secret-store interface consumed by the resolver
//! - **`validation`**: AWS identifier checks applied to configuration

pub mod backend;
pub mod environment;
pub mod validation;

pub use backend::*;
pub use environment::*;
pub use validation::*;
