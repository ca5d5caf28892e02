use std::fmt;

/// Sum type representing every possible unexceptional fail state.
#[derive(Debug)]
pub enum SlackError {
    /// Transport failure, a non-success HTTP status, or an undecodable body.
    APIRequestFailed(reqwest::Error),
    /// Slack answered with a falsy `ok`.
    APIResponseError(String),
}

impl From<reqwest::Error> for SlackError {
    fn from(e: reqwest::Error) -> Self {
        SlackError::APIRequestFailed(e)
    }
}

impl fmt::Display for SlackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = match self {
            SlackError::APIRequestFailed(e) => format!("Slack API request failed: {:?}", e),
            SlackError::APIResponseError(e) => format!("Slack API returned error: {}", e),
        };

        write!(f, "{}", x)
    }
}
