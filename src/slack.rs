//! Posts relay notifications to a Slack channel.
//!
//! Each forwarded webhook produces a short top-level message followed by a
//! threaded reply containing the payload. See [notify::notify].

pub mod api;
pub mod auth;
pub mod channel;
pub mod error;
pub mod message;
pub mod notify;
