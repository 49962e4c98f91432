//! Core domain types, errors, and constants for `aws-get-secret`.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias shared by every crate in
//!   the workspace. All failures are fatal for one invocation.
//! - **`types`**: the Environment Image, the backend interface and AWS
//!   identifier validation.
//! - **`constants`**: the reference scheme prefix, configuration defaults and
//!   the environment variable names the CLI reads.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
