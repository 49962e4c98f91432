//! AwsBackend against mocked STS and Secrets Manager endpoints

use getsecret_aws::{AwsBackend, AwsConfig, Credentials};
use getsecret_core::{Error, SecretBackend};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, header_exists, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/secret-reader";

async fn backend(server: &MockServer, role: Option<&str>, timeout: Duration) -> AwsBackend {
    let config = AwsConfig::new("us-east-2", timeout)
        .with_role(role.map(str::to_string))
        .with_session_name("test_session")
        .with_endpoint(Some(server.uri()));
    AwsBackend::with_credentials(
        config,
        Credentials::new("AKIDBASE", "base-secret", None, None, "test"),
    )
    .await
}

fn sts_success() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        r#"<AssumeRoleResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <AssumeRoleResult>
    <AssumedRoleUser>
      <AssumedRoleId>AROAEXAMPLE:test_session</AssumedRoleId>
      <Arn>arn:aws:sts::123456789012:assumed-role/secret-reader/test_session</Arn>
    </AssumedRoleUser>
    <Credentials>
      <AccessKeyId>ASIAASSUMED</AccessKeyId>
      <SecretAccessKey>assumed-secret</SecretAccessKey>
      <SessionToken>assumed-token</SessionToken>
      <Expiration>2099-01-01T00:00:00Z</Expiration>
    </Credentials>
  </AssumeRoleResult>
  <ResponseMetadata>
    <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
  </ResponseMetadata>
</AssumeRoleResponse>"#,
        "text/xml",
    )
}

#[tokio::test]
async fn test_fetch_secret_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", "secretsmanager.GetSecretValue"))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(header_regex("authorization", "Credential=AKIDBASE/"))
        .and(body_string_contains("\"SecretId\":\"prod/db\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "prod/db",
            "SecretString": "hunter2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server, None, Duration::from_secs(5)).await;
    assert!(backend.assume_role().await.unwrap().is_none());

    let value = backend.fetch_secret(None, "prod/db").await.unwrap();
    assert_eq!(value.payload(), b"hunter2");
}

#[tokio::test]
async fn test_assumed_role_signs_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Action=AssumeRole"))
        .and(body_string_contains("RoleSessionName=test_session"))
        .and(header_regex("authorization", "Credential=AKIDBASE/"))
        .respond_with(sts_success())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "secretsmanager.GetSecretValue"))
        .and(header("x-amz-security-token", "assumed-token"))
        .and(header_regex("authorization", "Credential=ASIAASSUMED/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "SecretBinary": "AJ+Slg=="
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server, Some(ROLE_ARN), Duration::from_secs(5)).await;
    let credential = backend.assume_role().await.unwrap().unwrap();
    assert_eq!(credential.access_key_id, "ASIAASSUMED");

    let value = backend
        .fetch_secret(Some(&credential), "keystore")
        .await
        .unwrap();
    assert_eq!(value.payload(), vec![0u8, 159, 146, 150]);
}

#[tokio::test]
async fn test_assume_role_failure_names_the_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_raw(
            r#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>AccessDenied</Code>
    <Message>not authorized to perform sts:AssumeRole</Message>
  </Error>
  <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
</ErrorResponse>"#,
            "text/xml",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server, Some(ROLE_ARN), Duration::from_secs(5))
        .await
        .assume_role()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AssumeRole { ref role_arn, .. } if role_arn == ROLE_ARN));
    assert!(err.to_string().contains("AccessDenied"), "{err}");
}

#[tokio::test]
async fn test_missing_secret_reports_service_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "ResourceNotFoundException",
            "Message": "Secrets Manager can't find the specified secret."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server, None, Duration::from_secs(5))
        .await
        .fetch_secret(None, "three")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { ref code, .. } if code == "ResourceNotFoundException"));
    assert!(err.to_string().contains("can't find the specified secret"), "{err}");
}

#[tokio::test]
async fn test_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "__type": "InternalServiceError",
            "Message": "try again"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server, None, Duration::from_secs(5))
        .await
        .fetch_secret(None, "flaky")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { ref code, .. } if code == "InternalServiceError"));
}

#[tokio::test]
async fn test_deadline_bounds_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"SecretString": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let err = backend(&server, None, Duration::from_millis(200))
        .await
        .fetch_secret(None, "slow")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }), "{err}");
    assert!(started.elapsed() < Duration::from_secs(2));
}
