use std::path::PathBuf;

/// Result type alias for aws-get-secret operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for aws-get-secret operations
///
/// Every variant is fatal for the invocation that produced it: the wrapper
/// never launches the child process once any of these has been returned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A secret reference in an environment variable could not be parsed
    #[error("failed to parse environment variable {variable}: {message}")]
    Parse { variable: String, message: String },

    /// The backend failed to deliver a secret
    #[error("failed to retrieve secret \"{secret_id}\" due to error {source}")]
    SecretFetch {
        secret_id: String,
        #[source]
        source: Box<Error>,
    },

    /// Assuming the configured role failed
    #[error("failed to assume role {role_arn}: {source}")]
    AssumeRole {
        role_arn: String,
        #[source]
        source: Box<Error>,
    },

    /// A retrieved payload could not be turned into its delivered value
    #[error("failed to transform secret {secret_id} value: {message}")]
    Transform { secret_id: String, message: String },

    /// Two references deliver to the same place
    #[error("{destination} is targeted by both {first} and {second}")]
    DestinationConflict {
        destination: String,
        first: String,
        second: String,
    },

    /// A resolved value could not be handed to its destination
    #[error("failed to deliver secret to {destination}: {message}")]
    Delivery { destination: String, message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// An error reported by an AWS service
    #[error("{service} returned {code}: {message}")]
    Backend {
        service: String,
        code: String,
        message: String,
    },

    /// A request that never got a service response: no credentials,
    /// connection failures and the like
    #[error("{service} request failed: {message}")]
    Transport { service: String, message: String },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Command execution errors
    #[error("{}", format_command_error(.command, .args, .message, .exit_code))]
    CommandExecution {
        command: String,
        args: Vec<String>,
        message: String,
        exit_code: Option<i32>,
    },
}

fn format_command_error(
    command: &str,
    args: &[String],
    message: &str,
    exit_code: &Option<i32>,
) -> String {
    let args_str = args.join(" ");
    let invocation = if args_str.is_empty() {
        command.to_string()
    } else {
        format!("{command} {args_str}")
    };
    match exit_code {
        Some(code) => format!("command '{invocation}' failed with exit code {code}: {message}"),
        None => format!("command '{invocation}' failed: {message}"),
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a reference parse error for an environment variable
    #[must_use]
    pub fn parse(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Wrap a backend failure with the secret it was fetching
    #[must_use]
    pub fn secret_fetch(secret_id: impl Into<String>, source: Error) -> Self {
        Error::SecretFetch {
            secret_id: secret_id.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a backend failure with the role it was assuming
    #[must_use]
    pub fn assume_role(role_arn: impl Into<String>, source: Error) -> Self {
        Error::AssumeRole {
            role_arn: role_arn.into(),
            source: Box::new(source),
        }
    }

    /// Create a transform error
    #[must_use]
    pub fn transform(secret_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transform {
            secret_id: secret_id.into(),
            message: message.into(),
        }
    }

    /// Create a destination conflict error
    #[must_use]
    pub fn destination_conflict(
        destination: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Error::DestinationConflict {
            destination: destination.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create a delivery error for a destination
    #[must_use]
    pub fn delivery(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Delivery {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create an AWS service error
    #[must_use]
    pub fn backend(
        service: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Backend {
            service: service.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    #[must_use]
    pub fn transport(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transport {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a command execution error
    #[must_use]
    pub fn command_execution(
        command: impl Into<String>,
        args: Vec<String>,
        message: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Error::CommandExecution {
            command: command.into(),
            args,
            message: message.into(),
            exit_code,
        }
    }
}
