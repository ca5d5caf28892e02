//! Relay subrouter definition.
//!
//! The following subroute is supported:
//!
//! - POST: `/relay`

use super::{
    error::RelayError,
    forward::{fan_out, forward},
    guard::is_self_target,
    payload::WebhookPayload,
};
use crate::router::Deps;
use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use axum_extra::{headers::Host, TypedHeader};
use hyper::body::Bytes;
use std::sync::Arc;

/// Instantiate a new relay subrouter. Payloads of any size are accepted.
pub fn relay_router() -> Router<Deps> {
    Router::new()
        .route("/relay", post(relay_handler).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::disable())
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Handler for the POST subroute `/relay`.
///
/// Accepts any JSON document with a `contactMetadata.webhookUrl` string, which
/// must be an absolute URL other than this endpoint. The document is forwarded
/// there; see [forward] for how its response shapes ours.
///
/// The body is read raw rather than through [axum::Json] so that a missing or
/// wrong `Content-Type` is treated like any other malformed body.
async fn relay_handler(
    State(deps): State<Deps>,
    host: Option<TypedHeader<Host>>,
    OriginalUri(uri): OriginalUri,
    body_bytes: Result<Bytes, BytesRejection>,
) -> Response {
    let body_bytes = match body_bytes {
        Ok(x) => x,
        Err(e) => return RelayError::UnreadableBody(e).into_response(),
    };

    let inbound_host = host
        .as_ref()
        .map(|TypedHeader(h)| h.hostname())
        .or_else(|| uri.host());

    match relay(&deps, inbound_host, uri.path(), &body_bytes).await {
        Ok(res) => res,
        Err(e) => e.into_response(),
    }
}

/// Validate, forward, and then fan out. Side notifications are only scheduled
/// once the relay target has answered.
async fn relay(
    deps: &Deps,
    inbound_host: Option<&str>,
    inbound_path: &str,
    body_bytes: &[u8],
) -> Result<Response, RelayError> {
    let payload = WebhookPayload::from_slice(body_bytes)?;
    let target = payload.relay_target()?;

    if is_self_target(inbound_host, inbound_path, &target) {
        return Err(RelayError::SelfTarget);
    }

    let body = payload.to_body()?;
    let res = forward(&deps.http_client, &target, body.clone()).await?;

    fan_out(deps, Arc::new(payload.0), body);

    Ok(res)
}
