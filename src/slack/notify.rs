//! Announce a forwarded webhook in Slack, with its payload in a thread.

use super::{api::SlackClient, auth::SlackAccessToken, channel::ChannelId, message::ChatThread};
use serde_json::Value;
use tracing::{error, info};

/// The top-level message posted for every forwarded webhook.
const NOTIFICATION_TEXT: &str = "Webhook forwarded successfully";

impl SlackClient {
    /// Post [NOTIFICATION_TEXT] to `channel`, then the payload as a reply in
    /// that message's thread. Never fails; any error is logged and ends the
    /// sequence.
    pub async fn notify(&self, payload: &Value, channel: &ChannelId, token: &SlackAccessToken) {
        let res = self
            .post_message_with_thread(channel, NOTIFICATION_TEXT, &fmt_payload(payload), token)
            .await;

        match res {
            Ok(ChatThread {
                channel,
                ts: Some(ts),
            }) => info!("Slack notification sent to {} in thread {}", channel, ts.0),
            Ok(ChatThread { channel, ts: None }) => {
                info!("Slack notification sent to {} unthreaded", channel)
            }
            Err(e) => error!("Failed to send Slack notification: {}", e),
        }
    }
}

/// Render a payload as a pretty-printed JSON code block.
fn fmt_payload(payload: &Value) -> String {
    let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());

    format!("Payload: \n\n```json\n{}\n```", pretty)
}
