//! Type definitions and helpers for the Slack API.

use super::auth::*;
use serde::Deserialize;

/// The base URL of the Slack API.
pub const API_BASE: &str = "https://slack.com/api";

/// A thin client over Slack's Web API. Cloning is cheap; the inner
/// [reqwest::Client] holds a shared connection pool.
#[derive(Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    base: String,
}

impl SlackClient {
    /// The base URL is injectable so that tests can point it at a mock server.
    pub fn new(client: reqwest::Client, base: String) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Create a POST request to any Slack API endpoint, handling
    /// authentication.
    pub fn post<T: ToString>(&self, path: T, token: &SlackAccessToken) -> reqwest::RequestBuilder {
        self.client
            .post(self.base.to_owned() + &path.to_string())
            .header(reqwest::header::AUTHORIZATION, to_auth_header_val(token))
    }
}

/// Slack's API returns a common "untagged" response, representing whether a
/// request was successful.
///
/// ```json
/// {
///     "ok": true,
///     "ts": "1503435956.000247"
/// }
/// ```
///
/// ```json
/// {
///     "ok": false,
///     "error": "invalid_auth"
/// }
/// ```
#[derive(Deserialize)]
#[serde(untagged)]
pub enum APIResult<T> {
    Ok(T),
    Err(ErrorResponse),
}

/// The universal response in case of an unsuccessful request.
// The `ok` field is checked here, and should be checked on responses too,
// primarily to ensure appropriate deserialization behaviour in case of an
// otherwise empty successful response.
#[derive(Deserialize)]
pub struct ErrorResponse {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::de::only_falsy")]
    ok: bool,
    #[serde(default)]
    pub error: String,
}
