//! Outbound webhook client for chat-provider webhooks.
//!
//! Build messages with [`Message`] and [`Embed`], queue them on a
//! [`Webhook`], and send them in one batch or individually. Every payload is
//! validated against provider limits before anything touches the network,
//! and rate-limited requests are retried for the caller.
//!
//! ```no_run
//! use hookpost::{create_client, Embed, Message};
//!
//! # async fn run() -> hookpost::Result<()> {
//! let mut webhook = create_client("https://discord.com/api/webhooks/123/token")?;
//!
//! webhook.enqueue(Message::text("deploy started"));
//! webhook.enqueue(Message::new().embed(Embed::new().title("v1.4.2").color(0x2ECC71)));
//! webhook.send_all().await?;
//!
//! webhook.success("Deploy finished", Some("all checks green")).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub use hookpost_core::{
    colors, validate_message, validation::limits, Author, Clock, Embed, Field, Footer, Image,
    Message, MessageId, RealClock, Thumbnail, ValidationIssue, ValidationReport,
};
pub use hookpost_delivery::{
    BatchFailure, ErrorKind, RateLimitPolicy, Result, Webhook, WebhookConfig, WebhookEndpoint,
    WebhookError,
};

/// Creates a client for the webhook at `url` with default configuration.
///
/// Only the last two path segments of `url` (`{id}/{token}`) are used.
///
/// # Errors
///
/// Returns [`WebhookError::Configuration`] if `url` has fewer than two path
/// segments.
pub fn create_client(url: &str) -> Result<Webhook> {
    Webhook::new(url)
}

/// Creates a client for the webhook at `url` with explicit configuration.
///
/// # Errors
///
/// Returns [`WebhookError::Configuration`] if `url` has fewer than two path
/// segments or `config` is invalid.
pub fn create_client_with_config(url: &str, config: &WebhookConfig) -> Result<Webhook> {
    Webhook::with_config(url, config)
}
