//! Webhook endpoint addressing.
//!
//! A provider-issued webhook URL ends in `/{id}/{token}`. Only those two
//! segments matter; requests are always sent to the configured API base so
//! the client can be pointed at a different host (for example a mock server).

use std::fmt;

use hookpost_core::MessageId;

use crate::error::{Result, WebhookError};

/// Provider's public API base.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api";

/// Id and secret token identifying one webhook.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookEndpoint {
    id: String,
    token: String,
}

impl WebhookEndpoint {
    /// Parses a webhook URL, keeping its last two path segments.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Configuration` if the URL has fewer than two
    /// non-empty `/`-separated segments.
    ///
    /// ```
    /// use hookpost_delivery::WebhookEndpoint;
    ///
    /// let endpoint =
    ///     WebhookEndpoint::parse("https://discord.com/api/webhooks/1234/s3cr3t").unwrap();
    /// assert_eq!(endpoint.id(), "1234");
    /// assert!(WebhookEndpoint::parse("just-a-token").is_err());
    /// ```
    pub fn parse(url: &str) -> Result<Self> {
        let mut segments = url.trim_end_matches('/').rsplit('/');
        let token = segments.next().filter(|s| !s.is_empty());
        let id = segments.next().filter(|s| !s.is_empty());

        match (id, token) {
            (Some(id), Some(token)) => Ok(Self { id: id.to_string(), token: token.to_string() }),
            _ => Err(WebhookError::configuration(format!(
                "webhook URL must end in /{{id}}/{{token}}, got {} path segment(s)",
                url.split('/').filter(|s| !s.is_empty()).count()
            ))),
        }
    }

    /// Returns the webhook id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the address all requests for this webhook are relative to.
    pub fn base_url(&self, api_base: &str) -> String {
        format!("{}/webhooks/{}/{}", api_base.trim_end_matches('/'), self.id, self.token)
    }
}

impl fmt::Debug for WebhookEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookEndpoint").field("id", &self.id).field("token", &"***").finish()
    }
}

/// Path suffix addressing a previously sent message.
pub fn message_path(id: &MessageId) -> String {
    format!("/messages/{id}")
}
