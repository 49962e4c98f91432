//! `aws-get-secret`: resolve `aws:///` secret references found in the
//! environment, then replace this process with the wrapped command.

pub mod cli;
pub mod platform;
pub mod run;
pub mod settings;

pub use cli::Cli;
pub use run::{prepare, run, Launch};
pub use settings::Settings;
