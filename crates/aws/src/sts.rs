//! STS `AssumeRole`

use crate::error::from_sdk;
use aws_sdk_sts::operation::assume_role::AssumeRoleOutput;
use aws_sdk_sts::Client;
use getsecret_core::{AssumedCredential, Error, Result};

pub const SERVICE: &str = "sts";

/// Assume `role_arn` once, under `session_name`
pub async fn assume_role(
    client: &Client,
    role_arn: &str,
    session_name: &str,
) -> Result<AssumedCredential> {
    let output = client
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name)
        .send()
        .await
        .map_err(|e| from_sdk(SERVICE, e))?;
    credential_from(&output)
}

fn credential_from(output: &AssumeRoleOutput) -> Result<AssumedCredential> {
    let credentials = output.credentials().ok_or_else(|| {
        Error::backend(SERVICE, "MissingCredentials", "AssumeRole returned no credentials")
    })?;
    Ok(AssumedCredential::new(
        credentials.access_key_id(),
        credentials.secret_access_key(),
        credentials.session_token(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sts::primitives::DateTime;
    use aws_sdk_sts::types::Credentials;

    #[test]
    fn test_credential_from_output() {
        let credentials = Credentials::builder()
            .access_key_id("ASIAEXAMPLE")
            .secret_access_key("secret")
            .session_token("token")
            .expiration(DateTime::from_secs(1_700_000_000))
            .build()
            .unwrap();
        let output = AssumeRoleOutput::builder().credentials(credentials).build();

        let credential = credential_from(&output).unwrap();
        assert_eq!(credential, AssumedCredential::new("ASIAEXAMPLE", "secret", "token"));
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let err = credential_from(&AssumeRoleOutput::builder().build()).unwrap_err();
        assert!(matches!(err, Error::Backend { ref code, .. } if code == "MissingCredentials"));
    }
}
