//! Secrets Manager `GetSecretValue`

use crate::error::from_sdk;
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueOutput;
use aws_sdk_secretsmanager::Client;
use getsecret_core::{Result, SecretValue};

pub const SERVICE: &str = "secretsmanager";

/// Fetch the current version of one secret
pub async fn get_secret_value(client: &Client, secret_id: &str) -> Result<SecretValue> {
    let output = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| from_sdk(SERVICE, e))?;
    Ok(secret_value_from(&output))
}

fn secret_value_from(output: &GetSecretValueOutput) -> SecretValue {
    SecretValue {
        secret_string: output.secret_string().map(str::to_string),
        secret_binary: output.secret_binary().map(|blob| blob.as_ref().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_secretsmanager::primitives::Blob;

    #[test]
    fn test_string_secret() {
        let output = GetSecretValueOutput::builder()
            .name("prod/db")
            .secret_string(r#"{"password":"hunter2"}"#)
            .build();
        let value = secret_value_from(&output);
        assert_eq!(value.payload(), br#"{"password":"hunter2"}"#);
        assert!(!value.is_binary());
    }

    #[test]
    fn test_binary_secret() {
        let output = GetSecretValueOutput::builder()
            .secret_binary(Blob::new(vec![0u8, 159, 146, 150]))
            .build();
        let value = secret_value_from(&output);
        assert!(value.is_binary());
        assert_eq!(value.payload(), vec![0u8, 159, 146, 150]);
    }

    #[test]
    fn test_empty_secret() {
        let value = secret_value_from(&GetSecretValueOutput::builder().build());
        assert!(value.payload().is_empty());
    }
}
