//! Environment-supplied configuration, read once at startup.

use crate::slack::{api::API_BASE, auth::SlackAccessToken, channel::ChannelId};
use std::{env, fmt};
use url::Url;

/// Port to bind to in the absence of `$PORT`.
const DEFAULT_PORT: u16 = 80;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub slack_token: SlackAccessToken,
    pub slack_channel: ChannelId,
    pub slack_api_base: String,
    /// Receives a best-effort copy of every forwarded payload.
    pub secondary_url: Url,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            ConfigError::Missing(k) => format!("No ${} environment variable found", k),
            ConfigError::Invalid(k, e) => format!("Could not parse ${}: {}", k, e),
        };

        write!(f, "{}", x)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Build from any key-value source. Empty values count as missing.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let get = |k| lookup(k).filter(|x| !x.is_empty());
        let require = |k| get(k).ok_or(ConfigError::Missing(k));

        let port = match get("PORT") {
            Some(x) => x
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::Invalid("PORT", e.to_string()))?,
            None => DEFAULT_PORT,
        };

        let secondary_url = Url::parse(&require("SECONDARY_WEBHOOK_URL")?)
            .map_err(|e| ConfigError::Invalid("SECONDARY_WEBHOOK_URL", e.to_string()))?;

        Ok(Self {
            port,
            slack_token: SlackAccessToken(require("SLACK_TOKEN")?),
            slack_channel: ChannelId(require("SLACK_CHANNEL_ID")?),
            slack_api_base: get("SLACK_API_BASE").unwrap_or_else(|| API_BASE.to_owned()),
            secondary_url,
        })
    }
}
