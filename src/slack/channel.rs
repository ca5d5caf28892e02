//! Slack channel identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Channels are referred to by their underlying ID rather than their name, as
/// names can change. This can be found in the UI by copying a link to the
/// channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelId(pub String);

/// Format without the surrounding newtype wrapper.
impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
