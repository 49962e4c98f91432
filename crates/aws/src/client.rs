//! The [`SecretBackend`] implementation for AWS

use crate::{secretsmanager, sts};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_secretsmanager::config::{Credentials, Region};
use getsecret_core::{
    AssumedCredential, Error, Result, SecretBackend, SecretValue, DEFAULT_SESSION_NAME,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Settings for one invocation
#[derive(Debug, Clone)]
pub struct AwsConfig {
    region: String,
    role_arn: Option<String>,
    session_name: String,
    endpoint: Option<String>,
    timeout: Duration,
    deadline: Instant,
}

impl AwsConfig {
    /// The deadline starts now and bounds every call made with this config.
    #[must_use]
    pub fn new(region: impl Into<String>, timeout: Duration) -> Self {
        Self {
            region: region.into(),
            role_arn: None,
            session_name: DEFAULT_SESSION_NAME.to_string(),
            endpoint: None,
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role_arn: Option<String>) -> Self {
        self.role_arn = role_arn.filter(|arn| !arn.is_empty());
        self
    }

    #[must_use]
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = session_name.into();
        self
    }

    /// Send every call to `endpoint`, e.g. a local emulator.
    ///
    /// Without one the SDK honors `AWS_ENDPOINT_URL` and falls back to the
    /// regional service endpoints.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint.filter(|url| !url.is_empty());
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn role_arn(&self) -> Option<&str> {
        self.role_arn.as_deref()
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }
}

/// Secrets Manager backend, optionally behind an assumed role
pub struct AwsBackend {
    config: AwsConfig,
    sdk_config: SdkConfig,
    sts: aws_sdk_sts::Client,
    secrets: aws_sdk_secretsmanager::Client,
}

impl AwsBackend {
    /// Base credentials come from the SDK's default provider chain and are
    /// only resolved on the first call.
    pub async fn load(config: AwsConfig) -> Self {
        Self::build(config, None).await
    }

    /// Use fixed base credentials instead of the provider chain
    pub async fn with_credentials(config: AwsConfig, credentials: Credentials) -> Self {
        Self::build(config, Some(credentials)).await
    }

    async fn build(config: AwsConfig, credentials: Option<Credentials>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.as_str());
        }
        if let Some(credentials) = credentials {
            loader = loader.credentials_provider(credentials);
        }
        let sdk_config = loader.load().await;

        Self {
            sts: aws_sdk_sts::Client::new(&sdk_config),
            secrets: aws_sdk_secretsmanager::Client::new(&sdk_config),
            sdk_config,
            config,
        }
    }

    pub fn config(&self) -> &AwsConfig {
        &self.config
    }

    /// Bound `future` by the invocation deadline
    async fn within_deadline<T>(
        &self,
        operation: &str,
        future: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout_at(self.config.deadline, future)
            .await
            .map_err(|_| Error::timeout(operation, self.config.timeout))?
    }

    /// A Secrets Manager client signing with the assumed role's session
    fn secrets_for(&self, credential: &AssumedCredential) -> aws_sdk_secretsmanager::Client {
        let config = aws_sdk_secretsmanager::config::Builder::from(&self.sdk_config)
            .credentials_provider(session_credentials(credential))
            .build();
        aws_sdk_secretsmanager::Client::from_conf(config)
    }
}

fn session_credentials(credential: &AssumedCredential) -> Credentials {
    Credentials::new(
        credential.access_key_id.as_str(),
        credential.secret_access_key.as_str(),
        Some(credential.session_token.clone()),
        None,
        "AssumeRole",
    )
}

#[async_trait]
impl SecretBackend for AwsBackend {
    async fn assume_role(&self) -> Result<Option<AssumedCredential>> {
        let Some(role_arn) = self.config.role_arn() else {
            return Ok(None);
        };

        tracing::debug!(role_arn = %role_arn, session_name = %self.config.session_name, "assuming role");
        let assumed = self
            .within_deadline(
                "AssumeRole",
                sts::assume_role(&self.sts, role_arn, &self.config.session_name),
            )
            .await
            .map_err(|e| Error::assume_role(role_arn, e))?;

        tracing::debug!(role_arn = %role_arn, access_key_id = %assumed.access_key_id, "assumed role");
        Ok(Some(assumed))
    }

    async fn fetch_secret(
        &self,
        credential: Option<&AssumedCredential>,
        secret_id: &str,
    ) -> Result<SecretValue> {
        let scoped;
        let client = match credential {
            Some(credential) => {
                scoped = self.secrets_for(credential);
                &scoped
            }
            None => &self.secrets,
        };

        tracing::debug!(%secret_id, "fetching secret");
        self.within_deadline(
            "GetSecretValue",
            secretsmanager::get_secret_value(client, secret_id),
        )
        .await
    }
}
