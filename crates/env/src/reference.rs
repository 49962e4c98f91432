//! Secret references declared in environment variables
//!
//! A variable whose value starts with `aws:` declares a secret to inject:
//!
//! ```text
//! aws:///<secret-id>?default=<str>&template=<text>&destination=<path>&chmod=<octal>&region=<str>
//! ```
//!
//! `${VAR}` placeholders inside the value are expanded from the environment
//! before the URI is parsed.

use crate::template::Template;
use getsecret_core::{
    EnvironmentImage, Error, Result, PARAM_CHMOD, PARAM_DEFAULT, PARAM_DESTINATION,
    PARAM_REGION, PARAM_TEMPLATE, SECRET_SCHEME, SECRET_SCHEME_PREFIX,
};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where a resolved secret is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Replace the value of an environment variable
    Env { name: String },
    /// Write to a file; a `mode` of zero leaves permissions alone
    File { path: PathBuf, mode: u32 },
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Env { name } => write!(f, "environment variable {name}"),
            Destination::File { path, .. } => write!(f, "file {}", path.display()),
        }
    }
}

/// One parsed declaration of a secret to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    variable: String,
    secret_id: String,
    default_value: String,
    template: Option<Template>,
    destination: Destination,
}

impl SecretReference {
    /// Name of the environment variable that declared this reference
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Identifier or ARN passed verbatim to the backend
    #[must_use]
    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    /// Value used when the retrieved payload is empty
    #[must_use]
    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    #[must_use]
    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    #[must_use]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Serialize the parsed fields back into reference syntax.
    ///
    /// Parsing the result yields an equal reference (placeholders aside).
    #[must_use]
    pub fn to_uri(&self) -> String {
        let path = self
            .secret_id
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if !self.default_value.is_empty() {
            query.append_pair(PARAM_DEFAULT, &self.default_value);
        }
        if let Some(template) = &self.template {
            query.append_pair(PARAM_TEMPLATE, template.source());
        }
        if let Destination::File { path, mode } = &self.destination {
            query.append_pair(PARAM_DESTINATION, &path.to_string_lossy());
            if *mode != 0 {
                query.append_pair(PARAM_CHMOD, &format!("{mode:o}"));
            }
        }
        let query = query.finish();

        if query.is_empty() {
            format!("{SECRET_SCHEME}:///{path}")
        } else {
            format!("{SECRET_SCHEME}:///{path}?{query}")
        }
    }
}

type Lookup<'a> = &'a (dyn Fn(&str) -> Option<String> + Sync);

fn process_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Settings that influence how references are parsed
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    verbose: bool,
    lookup: Lookup<'a>,
}

impl ParseContext<'static> {
    /// Expand placeholders from the current process environment
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            lookup: &process_lookup,
        }
    }
}

impl<'a> ParseContext<'a> {
    /// Expand placeholders through a custom lookup
    #[must_use]
    pub fn with_lookup(verbose: bool, lookup: Lookup<'a>) -> Self {
        Self { verbose, lookup }
    }

    fn expand(&self, value: &str) -> String {
        shellexpand::env_with_context_no_errors(value, |name| {
            Some((self.lookup)(name).unwrap_or_else(|| {
                if self.verbose {
                    tracing::warn!(
                        variable = %name,
                        "environment variable is not set, expanding to an empty string"
                    );
                }
                String::new()
            }))
        })
        .into_owned()
    }
}

impl fmt::Debug for ParseContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

/// Whether an environment value declares a secret reference
#[must_use]
pub fn is_reference(value: &str) -> bool {
    value.starts_with(SECRET_SCHEME_PREFIX)
}

/// Parse one reference declared by the variable `name`
pub fn parse(raw: &str, name: &str, ctx: &ParseContext<'_>) -> Result<SecretReference> {
    let expanded = ctx.expand(raw);
    let url = Url::parse(&expanded)
        .map_err(|e| Error::parse(name, format!("invalid reference uri, {e}")))?;

    if url.scheme() != SECRET_SCHEME {
        return Err(Error::parse(
            name,
            format!("unsupported scheme '{}', use aws:///", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(Error::parse(
            name,
            "has an aws: uri without a path, use aws:///<secret-id>",
        ));
    }
    if url.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(Error::parse(
            name,
            "has an aws: uri, but specified a host. use aws:///",
        ));
    }

    let path = urlencoding::decode(url.path())
        .map_err(|e| Error::parse(name, format!("secret id is not valid UTF-8, {e}")))?;
    let secret_id = path.strip_prefix('/').unwrap_or(&path).to_string();
    if secret_id.is_empty() {
        return Err(Error::parse(name, "reference does not name a secret"));
    }

    // The first occurrence of a key wins
    let mut params: HashMap<String, String> = HashMap::new();
    for (key, value) in url.query_pairs() {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }

    let default_value = lookup_param(&params, PARAM_DEFAULT).to_string();

    // Accepted for compatibility, the configured region applies to every reference
    if !lookup_param(&params, PARAM_REGION).is_empty() {
        tracing::debug!(variable = %name, "ignoring region query parameter");
    }

    let template = match lookup_param(&params, PARAM_TEMPLATE) {
        "" => None,
        source => Some(Template::compile(source).map_err(|e| {
            Error::parse(name, format!("invalid template syntax '{source}', {e}"))
        })?),
    };

    let chmod = lookup_param(&params, PARAM_CHMOD);
    let destination = match lookup_param(&params, PARAM_DESTINATION) {
        "" => {
            if !chmod.is_empty() && ctx.verbose {
                tracing::warn!(variable = %name, "chmod has no effect without a destination");
            }
            Destination::Env {
                name: name.to_string(),
            }
        }
        file => Destination::File {
            path: PathBuf::from(file),
            mode: match chmod {
                "" => 0,
                chmod => parse_mode(chmod).map_err(|message| Error::parse(name, message))?,
            },
        },
    };

    Ok(SecretReference {
        variable: name.to_string(),
        secret_id,
        default_value,
        template,
        destination,
    })
}

fn lookup_param<'m>(params: &'m HashMap<String, String>, key: &str) -> &'m str {
    params.get(key).map_or("", String::as_str)
}

fn parse_mode(chmod: &str) -> std::result::Result<u32, String> {
    let mode =
        u32::from_str_radix(chmod, 8).map_err(|e| format!("chmod '{chmod}' is not valid, {e}"))?;
    if mode > 0o7777 {
        return Err(format!("chmod '{chmod}' is not valid, permission bits exceed 7777"));
    }
    Ok(mode)
}

/// Parse every reference declared in an environment image, in order.
///
/// Entries that are not valid UTF-8 never qualify and pass through untouched.
pub fn parse_environment(
    env: &EnvironmentImage,
    ctx: &ParseContext<'_>,
) -> Result<Vec<SecretReference>> {
    env.text_pairs()
        .filter(|(_, value)| is_reference(value))
        .map(|(name, value)| parse(value, name, ctx))
        .collect()
}
