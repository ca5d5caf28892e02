//! Relay inbound webhooks to the URL named in their own payload.
//!
//! A payload must carry `contactMetadata.webhookUrl`. The payload is POSTed
//! there and the outcome decides our response. Every forwarded payload is
//! also mirrored to the secondary endpoint and announced in Slack; neither of
//! those can affect the response.

mod error;
mod forward;
mod guard;
mod payload;
pub mod router;
