//! Webhook messages: the unit queued, validated and delivered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embed::Embed;

/// A message ready to be posted (or used to edit a previous post).
///
/// Serializes to the provider's JSON payload. The edit target is client-side
/// routing information and never appears in the payload.
///
/// # Example
///
/// ```
/// use hookpost_core::{Embed, Message};
///
/// let message = Message::new()
///     .content("build #42 is green")
///     .username("ci-bot")
///     .embed(Embed::new().title("Summary"));
///
/// let payload = message.payload();
/// assert_eq!(payload["content"], "build #42 is green");
/// assert!(payload.get("edit_target").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Plain text body (max 2000 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Overrides the webhook's display name for this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Overrides the webhook's avatar for this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Text-to-speech flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<bool>,
    /// Rich embeds (max 10).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Creates a thread with this name (forum channels only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    /// Provider message flags bitfield.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    /// Id or link of a previous message; turns the send into an edit.
    #[serde(skip)]
    pub edit_target: Option<String>,
}

impl Message {
    /// Creates an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a message with text content only.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new().content(content)
    }

    /// Sets the text content.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Overrides the display name.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Overrides the avatar.
    #[must_use]
    pub fn avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Sets the text-to-speech flag.
    #[must_use]
    pub fn tts(mut self, tts: bool) -> Self {
        self.tts = Some(tts);
        self
    }

    /// Appends an embed.
    #[must_use]
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Appends several embeds in order.
    #[must_use]
    pub fn embeds(mut self, embeds: impl IntoIterator<Item = Embed>) -> Self {
        self.embeds.extend(embeds);
        self
    }

    /// Creates a thread with this name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// Sets the message flags bitfield.
    #[must_use]
    pub fn flags(mut self, flags: u64) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Marks this message as an edit of a previously sent message.
    ///
    /// Accepts a bare message id or a message link ending in the id.
    #[must_use]
    pub fn edit_target(mut self, id_or_link: impl Into<String>) -> Self {
        self.edit_target = Some(id_or_link.into());
        self
    }

    /// Returns the JSON payload exactly as it is sent on the wire.
    pub fn payload(&self) -> Value {
        // Every field is a string, bool, integer or nested struct of those,
        // so serialization into a Value cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unset_fields_are_omitted() {
        assert_eq!(Message::text("hi").payload(), json!({ "content": "hi" }));
        assert_eq!(Message::new().payload(), json!({}));
    }

    #[test]
    fn edit_target_stays_off_the_wire() {
        let message = Message::text("edited").edit_target("https://x.test/c/1/2/3");
        assert_eq!(message.payload(), json!({ "content": "edited" }));
        assert_eq!(message.edit_target.as_deref(), Some("https://x.test/c/1/2/3"));
    }

    #[test]
    fn overrides_and_flags_serialized() {
        let message = Message::text("x")
            .username("bot")
            .avatar_url("https://example.com/a.png")
            .tts(true)
            .thread_name("release")
            .flags(4096)
            .embed(Embed::new().title("t"));

        assert_eq!(
            message.payload(),
            json!({
                "content": "x",
                "username": "bot",
                "avatar_url": "https://example.com/a.png",
                "tts": true,
                "thread_name": "release",
                "flags": 4096,
                "embeds": [{ "title": "t", "fields": [] }]
            })
        );
    }
}
