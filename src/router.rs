//! Server router definition.
//!
//! The following routes are supported:
//!
//! - GET: `/api/v1/health`
//! - POST: `/api/v1/relay`

use crate::{
    config::Config,
    relay::router::relay_router,
    slack::{api::SlackClient, auth::SlackAccessToken, channel::ChannelId},
};
use axum::{http::StatusCode, routing::get, Router};
use tokio_util::task::TaskTracker;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;
use url::Url;

/// Dependencies shared by routes across requests.
#[derive(Clone)]
pub struct Deps {
    pub http_client: reqwest::Client,
    pub slack_client: SlackClient,
    pub slack_token: SlackAccessToken,
    pub slack_channel: ChannelId,
    pub secondary_url: Url,
    /// Background work outliving its request. Drained before shutdown.
    pub tasks: TaskTracker,
}

impl Deps {
    pub fn new(config: &Config, tasks: TaskTracker) -> Self {
        let http_client = reqwest::Client::new();

        Self {
            slack_client: SlackClient::new(http_client.clone(), config.slack_api_base.clone()),
            http_client,
            slack_token: config.slack_token.clone(),
            slack_channel: config.slack_channel.clone(),
            secondary_url: config.secondary_url.clone(),
            tasks,
        }
    }
}

/// Instantiate a new router with tracing.
pub fn new(deps: Deps) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
        .on_response(trace::DefaultOnResponse::new().level(Level::INFO));

    let v1 = Router::new()
        .merge(relay_router())
        .layer(trace_layer)
        // Exclude the health check route from tracing.
        .route("/health", get(|| async { StatusCode::OK }));

    let api = Router::new().nest("/v1", v1);

    Router::new().nest("/api", api).with_state(deps)
}


#[cfg(test)]
mod tests_relay {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use mockito::{Matcher, Mock, ServerGuard};
    use serde_json::json;
    use tower::ServiceExt;

    const SUCCESS_BODY: &str = r#"{"success":true,"message":"Webhook forwarded successfully"}"#;

    /// Every outbound endpoint lives on the same mock server under a distinct
    /// path.
    fn deps(srv: &ServerGuard) -> Deps {
        Deps {
            http_client: reqwest::Client::new(),
            slack_client: SlackClient::new(reqwest::Client::new(), format!("{}/slack", srv.url())),
            slack_token: SlackAccessToken("xoxb-foo".to_owned()),
            slack_channel: ChannelId("C0123".to_owned()),
            secondary_url: Url::parse(&format!("{}/secondary", srv.url())).unwrap(),
            tasks: TaskTracker::new(),
        }
    }

    async fn server() -> ServerGuard {
        mockito::Server::new_async().await
    }

    fn relay_req<T: Into<Body>>(method: &str, body: T) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/api/v1/relay")
            .header("Host", "relay.example")
            .header("Content-Type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn payload_for(url: String) -> String {
        json!({
            "contactMetadata": {"webhookUrl": url},
            "name": "Ada"
        })
        .to_string()
    }

    async fn plaintext_body(body: Body) -> String {
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Send a request, then wait for any background tasks it spawned.
    async fn send(deps: Deps, req: Request<Body>) -> (StatusCode, String) {
        let tasks = deps.tasks.clone();
        let res = super::new(deps).oneshot(req).await.unwrap();

        let status = res.status();
        let body = plaintext_body(res.into_body()).await;

        tasks.close();
        tasks.wait().await;

        (status, body)
    }

    /// A mock which must never be hit.
    async fn untouched(srv: &mut ServerGuard, path: &str) -> Mock {
        srv.mock("POST", path)
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await
    }

    async fn slack_ok(srv: &mut ServerGuard) -> (Mock, Mock) {
        let parent = srv
            .mock("POST", "/slack/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-foo")
            .match_body(Matcher::PartialJson(json!({
                "channel": "C0123",
                "text": "Webhook forwarded successfully"
            })))
            .with_body(r#"{"ok": true, "ts": "1700000000.000100"}"#)
            .expect(1)
            .create_async()
            .await;

        let reply = srv
            .mock("POST", "/slack/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-foo")
            .match_body(Matcher::PartialJson(json!({
                "channel": "C0123",
                "thread_ts": "1700000000.000100"
            })))
            .with_body(r#"{"ok": true, "ts": "1700000000.000200"}"#)
            .expect(1)
            .create_async()
            .await;

        (parent, reply)
    }

    #[tokio::test]
    async fn test_bad_method() {
        let mut srv = server().await;
        let secondary = untouched(&mut srv, "/secondary").await;
        let slack = untouched(&mut srv, "/slack/chat.postMessage").await;

        for method in ["GET", "PUT", "DELETE", "PATCH"] {
            let body = payload_for(format!("{}/hook", srv.url()));
            let (status, body) = send(deps(&srv), relay_req(method, body)).await;

            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, "Method not allowed");
        }

        secondary.assert_async().await;
        slack.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let mut srv = server().await;
        let secondary = untouched(&mut srv, "/secondary").await;

        for body in ["", "{", "not json", "<xml/>"] {
            let (status, res_body) = send(deps(&srv), relay_req("POST", body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(res_body, "Bad request");
        }

        secondary.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_webhook_url() {
        let mut srv = server().await;
        let secondary = untouched(&mut srv, "/secondary").await;

        let bodies = [
            json!({"contactMetadata": {"webhookUrl": "not-a-url"}}),
            json!({"contactMetadata": {}}),
            json!({"contactMetadata": {"webhookUrl": 5}}),
            json!({"name": "Ada"}),
            json!([]),
        ];

        for body in bodies {
            let (status, res_body) =
                send(deps(&srv), relay_req("POST", body.to_string())).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(res_body, "Invalid webhook URL");
        }

        secondary.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_to_itself() {
        let mut srv = server().await;
        let secondary = untouched(&mut srv, "/secondary").await;
        let slack = untouched(&mut srv, "/slack/chat.postMessage").await;

        for url in [
            "https://relay.example/api/v1/relay",
            "http://relay.example:8080/api/v1/relay?again=1",
        ] {
            let body = payload_for(url.to_owned());
            let (status, res_body) = send(deps(&srv), relay_req("POST", body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(res_body, "Cannot forward webhook to itself");
        }

        secondary.assert_async().await;
        slack.assert_async().await;
    }

    #[tokio::test]
    async fn test_success() {
        let mut srv = server().await;
        let body = payload_for(format!("{}/hook", srv.url()));

        let hook = srv
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Exact(body.clone()))
            .with_status(202)
            .with_body("ignored")
            .expect(1)
            .create_async()
            .await;

        let secondary = srv
            .mock("POST", "/secondary")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Exact(body.clone()))
            .expect(1)
            .create_async()
            .await;

        let (parent, reply) = slack_ok(&mut srv).await;

        let (status, res_body) = send(deps(&srv), relay_req("POST", body)).await;

        hook.assert_async().await;
        secondary.assert_async().await;
        parent.assert_async().await;
        reply.assert_async().await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res_body, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn test_passthrough() {
        let mut srv = server().await;
        let body = payload_for(format!("{}/hook", srv.url()));

        let hook = srv
            .mock("POST", "/hook")
            .with_status(418)
            .with_header("x-upstream", "teapot")
            .with_body("short and stout")
            .expect(1)
            .create_async()
            .await;

        let secondary = srv
            .mock("POST", "/secondary")
            .expect(1)
            .create_async()
            .await;

        let (parent, reply) = slack_ok(&mut srv).await;

        let tasks = TaskTracker::new();
        let res = super::new(Deps {
            tasks: tasks.clone(),
            ..deps(&srv)
        })
        .oneshot(relay_req("POST", body))
        .await
        .unwrap();

        assert_eq!(res.status().as_u16(), 418);
        assert_eq!(res.headers().get("x-upstream").unwrap(), "teapot");
        assert_eq!(plaintext_body(res.into_body()).await, "short and stout");

        tasks.close();
        tasks.wait().await;

        hook.assert_async().await;
        secondary.assert_async().await;
        parent.assert_async().await;
        reply.assert_async().await;
    }

    #[tokio::test]
    async fn test_background_failures_are_ignored() {
        let mut srv = server().await;
        let body = payload_for(format!("{}/hook", srv.url()));

        let hook = srv.mock("POST", "/hook").expect(1).create_async().await;

        let secondary = srv
            .mock("POST", "/secondary")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let slack = srv
            .mock("POST", "/slack/chat.postMessage")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let (status, res_body) = send(deps(&srv), relay_req("POST", body)).await;

        hook.assert_async().await;
        secondary.assert_async().await;
        slack.assert_async().await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res_body, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn test_slack_not_ok_skips_thread() {
        let mut srv = server().await;
        let body = payload_for(format!("{}/hook", srv.url()));

        let hook = srv.mock("POST", "/hook").expect(1).create_async().await;
        let secondary = srv.mock("POST", "/secondary").expect(1).create_async().await;

        let slack = srv
            .mock("POST", "/slack/chat.postMessage")
            .with_body(r#"{"ok": false, "error": "channel_not_found"}"#)
            .expect(1)
            .create_async()
            .await;

        let (status, res_body) = send(deps(&srv), relay_req("POST", body)).await;

        hook.assert_async().await;
        secondary.assert_async().await;
        slack.assert_async().await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res_body, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn test_large_payload() {
        let mut srv = server().await;

        // Comfortably past axum's default body limit.
        let body = json!({
            "contactMetadata": {"webhookUrl": format!("{}/hook", srv.url())},
            "padding": "x".repeat(3 * 1024 * 1024)
        })
        .to_string();

        let hook = srv
            .mock("POST", "/hook")
            .match_body(Matcher::Exact(body.clone()))
            .expect(1)
            .create_async()
            .await;

        let secondary = srv.mock("POST", "/secondary").expect(1).create_async().await;

        let (status, res_body) = send(deps(&srv), relay_req("POST", body)).await;

        hook.assert_async().await;
        secondary.assert_async().await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res_body, SUCCESS_BODY);
    }

    #[tokio::test]
    async fn test_unreachable_target() {
        let mut srv = server().await;
        let secondary = untouched(&mut srv, "/secondary").await;

        // Nothing listens on port 1.
        let body = payload_for("http://127.0.0.1:1/hook".to_owned());
        let (status, res_body) = send(deps(&srv), relay_req("POST", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(res_body, "Bad request");

        secondary.assert_async().await;
    }
}
