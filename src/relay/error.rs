use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use tracing::warn;

/// Every way the synchronous relay path can fail. Distinct internally, though
/// callers only ever see a `400`.
#[derive(Debug)]
pub enum RelayError {
    UnreadableBody(BytesRejection),
    MalformedBody(serde_json::Error),
    InvalidTarget,
    SelfTarget,
    TargetUnreachable(reqwest::Error),
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::MalformedBody(e)
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::TargetUnreachable(e)
    }
}

impl RelayError {
    /// The body we reply with. Deliberately less detailed than [fmt::Display].
    fn public_message(&self) -> &'static str {
        match self {
            RelayError::UnreadableBody(_)
            | RelayError::MalformedBody(_)
            | RelayError::TargetUnreachable(_) => "Bad request",
            RelayError::InvalidTarget => "Invalid webhook URL",
            RelayError::SelfTarget => "Cannot forward webhook to itself",
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            RelayError::UnreadableBody(e) => format!("Failed to read request body: {}", e),
            RelayError::MalformedBody(e) => format!("Failed to deserialize payload: {}", e),
            RelayError::InvalidTarget => "Missing or invalid webhook URL".into(),
            RelayError::SelfTarget => "Webhook URL points back at the relay".into(),
            RelayError::TargetUnreachable(e) => format!("Relay target request failed: {:?}", e),
        };

        write!(f, "{}", x)
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        warn!("{}", self);

        (StatusCode::BAD_REQUEST, self.public_message()).into_response()
    }
}
