/// Constants used throughout the aws-get-secret codebase
// Reference scheme
pub const SECRET_SCHEME_PREFIX: &str = "aws:";
pub const SECRET_SCHEME: &str = "aws";

// Recognized reference query parameters
pub const PARAM_DEFAULT: &str = "default";
pub const PARAM_TEMPLATE: &str = "template";
pub const PARAM_DESTINATION: &str = "destination";
pub const PARAM_CHMOD: &str = "chmod";
pub const PARAM_REGION: &str = "region";

// Configuration defaults
pub const DEFAULT_REGION: &str = "us-east-2";
pub const DEFAULT_SESSION_NAME: &str = "param_session";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

// Environment variable names
pub const REGION_VAR: &str = "AWS_GET_SECRET_REGION";
pub const ROLE_VAR: &str = "AWS_GET_SECRET_ROLE";
pub const TIMEOUT_VAR: &str = "AWS_GET_SECRET_TIMEOUT";
pub const SESSION_NAME_VAR: &str = "AWS_GET_SECRET_SESSION_NAME";
pub const VERBOSE_VAR: &str = "AWS_GET_SECRET_VERBOSE";

// Command that resolves secrets without launching anything
pub const NOOP_COMMAND: &str = "noop";
