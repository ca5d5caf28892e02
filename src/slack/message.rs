//! Send plain text messages, optionally threaded, to a Slack channel.

use super::{api::*, auth::SlackAccessToken, channel::ChannelId, error::SlackError};
use serde::{Deserialize, Serialize};

/// The timestamp Slack assigns a message, doubling as its thread identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadTs(pub String);

/// A parent message and the channel it lives in, enabling threaded replies.
/// Without a `ts` from Slack there's nothing to thread onto.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatThread {
    pub channel: ChannelId,
    pub ts: Option<ThreadTs>,
}

/// <https://api.slack.com/methods/chat.postMessage#args>
#[derive(Serialize)]
struct MessageRequest<'a> {
    channel: &'a ChannelId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a ThreadTs>,
}

/// <https://api.slack.com/methods/chat.postMessage#examples>
#[derive(Deserialize)]
pub struct MessageResponse {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::de::only_truthy")]
    ok: bool,
    pub ts: Option<ThreadTs>,
}

impl SlackClient {
    /// Post a message in a channel, or as a reply within a thread if
    /// `thread_ts` is supplied.
    ///
    /// A non-success HTTP status is a failure, as is a falsy `ok`.
    pub async fn post_message(
        &self,
        channel: &ChannelId,
        text: &str,
        thread_ts: Option<&ThreadTs>,
        token: &SlackAccessToken,
    ) -> Result<MessageResponse, SlackError> {
        let res: APIResult<MessageResponse> = self
            .post("/chat.postMessage", token)
            .json(&MessageRequest {
                channel,
                text,
                thread_ts,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match res {
            APIResult::Ok(res) => Ok(res),
            APIResult::Err(res) => Err(SlackError::APIResponseError(res.error)),
        }
    }

    /// Post a message and then a reply to it in its thread. The second message
    /// is only attempted if the first succeeds. Should Slack omit the first
    /// message's `ts`, the reply is posted to the channel unthreaded.
    pub async fn post_message_with_thread(
        &self,
        channel: &ChannelId,
        text: &str,
        thread_text: &str,
        token: &SlackAccessToken,
    ) -> Result<ChatThread, SlackError> {
        let parent = self.post_message(channel, text, None, token).await?;
        let ts = parent.ts;

        self.post_message(channel, thread_text, ts.as_ref(), token).await?;

        Ok(ChatThread {
            channel: channel.clone(),
            ts,
        })
    }
}
