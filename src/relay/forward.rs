//! Forward a validated payload to its relay target, and fan out the
//! best-effort side notifications.

use super::error::RelayError;
use crate::router::Deps;
use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hyper::body::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, Instrument};
use url::Url;

/// Headers describing the upstream connection rather than its content, which
/// we mustn't copy onto our own response.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "content-length",
];

/// The body we reply with whenever the relay target accepts the payload,
/// regardless of what it said.
#[derive(Serialize)]
struct SuccessEnvelope {
    success: bool,
    message: &'static str,
}

const SUCCESS: SuccessEnvelope = SuccessEnvelope {
    success: true,
    message: "Webhook forwarded successfully",
};

/// POST an encoded payload to `url` as JSON.
async fn post_json(
    client: &reqwest::Client,
    url: &Url,
    body: Bytes,
) -> reqwest::Result<reqwest::Response> {
    client
        .post(url.clone())
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
}

/// Forward to the relay target and shape our response from its own: a fixed
/// envelope on success, or its status, headers, and body otherwise.
pub async fn forward(
    client: &reqwest::Client,
    target: &Url,
    body: Bytes,
) -> Result<Response, RelayError> {
    let res = post_json(client, target, body).await?;

    if res.status().is_success() {
        info!("Forwarded webhook to {}", target);

        return Ok((StatusCode::OK, Json(SUCCESS)).into_response());
    }

    info!(
        "Relay target {} responded {}, passing through",
        target,
        res.status()
    );

    // `reqwest` and `axum` may disagree on their `http` version, so convert
    // through primitives.
    let status = StatusCode::from_u16(res.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let headers = passthrough_headers(res.headers());
    let body = res.bytes().await?;

    Ok((status, headers, body).into_response())
}

fn passthrough_headers(upstream: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());

    for (name, value) in upstream {
        if HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }

        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }

    headers
}

/// Mirror the encoded payload to the secondary endpoint. Failures are logged
/// and otherwise ignored.
async fn mirror(client: &reqwest::Client, url: &Url, body: Bytes) {
    let res = post_json(client, url, body)
        .await
        .and_then(reqwest::Response::error_for_status);

    match res {
        Ok(_) => info!("Mirrored webhook to secondary endpoint"),
        Err(e) => error!("Failed to mirror webhook to secondary endpoint: {:?}", e),
    }
}

/// Schedule the secondary mirror and the Slack notification on the task
/// tracker. Neither is awaited here, and neither can fail the request.
pub fn fan_out(deps: &Deps, payload: Arc<Value>, body: Bytes) {
    let client = deps.http_client.clone();
    let secondary_url = deps.secondary_url.clone();

    deps.tasks.spawn(
        async move { mirror(&client, &secondary_url, body).await }.in_current_span(),
    );

    let slack = deps.slack_client.clone();
    let channel = deps.slack_channel.clone();
    let token = deps.slack_token.clone();

    deps.tasks.spawn(
        async move { slack.notify(&payload, &channel, &token).await }.in_current_span(),
    );
}
