//! Interface to the external secret store
//!
//! The resolver only needs two operations from a backend: obtain a temporary
//! credential for the configured role, and fetch one secret value with it.

use crate::errors::Result;
use async_trait::async_trait;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Temporary access grant obtained by assuming a role
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AssumedCredential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl AssumedCredential {
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
        }
    }
}

impl fmt::Debug for AssumedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumedCredential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[redacted]")
            .field("session_token", &"[redacted]")
            .finish()
    }
}

/// A secret as returned by the store: text, binary, or (rarely) neither
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue {
    pub secret_string: Option<String>,
    pub secret_binary: Option<Vec<u8>>,
}

impl SecretValue {
    /// A secret stored in text form
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            secret_string: Some(value.into()),
            secret_binary: None,
        }
    }

    /// A secret stored in binary form
    #[must_use]
    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self {
            secret_string: None,
            secret_binary: Some(value.into()),
        }
    }

    /// Whether the payload comes from the binary form
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.secret_string.is_none() && self.secret_binary.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// The raw payload. Text wins over binary; an absent secret is empty.
    #[must_use]
    pub fn payload(&self) -> Vec<u8> {
        if let Some(text) = &self.secret_string {
            return text.as_bytes().to_vec();
        }
        match &self.secret_binary {
            Some(binary) if !binary.is_empty() => binary.clone(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("is_binary", &self.is_binary())
            .field("len", &self.payload().len())
            .finish()
    }
}

/// Secret store consulted by the resolver
///
/// Implementations must not retry internally; one call is one attempt.
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// Obtain a credential for the configured role.
    ///
    /// Returns `Ok(None)` when no role is configured, in which case fetches
    /// use the ambient credentials.
    async fn assume_role(&self) -> Result<Option<AssumedCredential>>;

    /// Fetch the current value of one secret
    async fn fetch_secret(
        &self,
        credential: Option<&AssumedCredential>,
        secret_id: &str,
    ) -> Result<SecretValue>;
}
