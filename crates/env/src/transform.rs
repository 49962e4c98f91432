//! Conversion of a retrieved payload into the value that gets delivered

use crate::reference::SecretReference;
use getsecret_core::{Error, Result};
use serde_json::{Map, Value};

/// Apply the default and the optional template of `reference` to a payload.
///
/// An empty payload is replaced by the reference's default first. Without a
/// template the bytes pass through untouched. With a template, a payload
/// starting with `{` is handed over as a JSON object, anything else as one
/// string.
pub fn transform(reference: &SecretReference, payload: Vec<u8>) -> Result<Vec<u8>> {
    let value = if payload.is_empty() {
        reference.default_value().as_bytes().to_vec()
    } else {
        payload
    };

    let Some(template) = reference.template() else {
        return Ok(value);
    };

    let data = if value.first() == Some(&b'{') {
        let object: Map<String, Value> = serde_json::from_slice(&value).map_err(|e| {
            Error::transform(
                reference.secret_id(),
                format!("failed to parse secret as JSON: {e}"),
            )
        })?;
        Value::Object(object)
    } else {
        Value::String(String::from_utf8_lossy(&value).into_owned())
    };

    template
        .render(&data)
        .map(String::into_bytes)
        .map_err(|e| Error::transform(reference.secret_id(), e.to_string()))
}
