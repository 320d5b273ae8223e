//! Identifiers for messages previously posted through a webhook.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a message already posted through the webhook.
///
/// Edit and delete requests address a message by this id. Callers usually
/// have either the bare snowflake or a full message link such as
/// `https://discord.com/channels/1/2/123456789`; both forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Extracts the id from a bare numeric id or a link ending in one.
    ///
    /// Returns `None` when the input has no trailing numeric segment.
    ///
    /// ```
    /// use hookpost_core::MessageId;
    ///
    /// let id = MessageId::from_link("https://discord.com/channels/1/2/123456789").unwrap();
    /// assert_eq!(id.as_str(), "123456789");
    /// assert!(MessageId::from_link("not-a-link").is_none());
    /// ```
    pub fn from_link(link: &str) -> Option<Self> {
        let tail = link.rsplit('/').next().unwrap_or(link);
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(tail.to_string()))
        } else {
            None
        }
    }

    /// Like [`MessageId::from_link`], but treats the whole input as the id
    /// when no trailing numeric segment is found.
    pub fn from_link_or_raw(input: &str) -> Self {
        Self::from_link(input).unwrap_or_else(|| Self(input.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
