//! SDK failures as [`Error`]s

use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use getsecret_core::Error;
use std::fmt;

/// Service errors keep their error code. Everything else, including missing
/// credentials and transport failures, carries its full cause chain.
pub(crate) fn from_sdk<E, R>(service: &str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    if let SdkError::ServiceError(context) = &err {
        let service_err = context.err();
        if let Some(code) = service_err.code() {
            return Error::backend(service, code, service_err.message().unwrap_or_default());
        }
    }
    Error::transport(service, DisplayErrorContext(err).to_string())
}
