//! The inbound webhook payload.

use super::error::RelayError;
use hyper::body::Bytes;
use serde_json::Value;
use url::Url;

/// An arbitrary JSON document. Only `contactMetadata.webhookUrl` is ever
/// inspected.
#[derive(Debug)]
pub struct WebhookPayload(pub Value);

impl WebhookPayload {
    pub fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
        Ok(Self(serde_json::from_slice(body)?))
    }

    /// The relay target. Must be a string that parses as an absolute URL.
    pub fn relay_target(&self) -> Result<Url, RelayError> {
        self.0
            .pointer("/contactMetadata/webhookUrl")
            .and_then(Value::as_str)
            .and_then(|x| Url::parse(x).ok())
            .ok_or(RelayError::InvalidTarget)
    }

    /// Re-encode the payload for sending onwards. This is not a byte-for-byte
    /// copy of the inbound body, though key order is kept.
    pub fn to_body(&self) -> Result<Bytes, RelayError> {
        Ok(serde_json::to_vec(&self.0)?.into())
    }
}
