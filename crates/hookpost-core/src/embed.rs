//! Rich embed blocks and their component parts.
//!
//! Embeds serialize to the provider's wire shape directly: unset optionals
//! are omitted and `fields` is always present, even when empty.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Author line rendered at the top of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Display name (max 256 characters).
    pub name: String,
    /// Link attached to the author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Small icon rendered next to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Author {
    /// Creates an author with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), url: None, icon_url: None }
    }

    /// Sets the author link.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the author icon.
    #[must_use]
    pub fn icon_url(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = Some(icon_url.into());
        self
    }
}

/// Footer line rendered at the bottom of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    /// Footer text (max 2048 characters).
    pub text: String,
    /// Small icon rendered next to the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Footer {
    /// Creates a footer with text only.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), icon_url: None }
    }

    /// Sets the footer icon.
    #[must_use]
    pub fn icon_url(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = Some(icon_url.into());
        self
    }
}

/// Large image rendered below the embed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Source URL of the image.
    pub url: String,
}

impl Image {
    /// Creates an image from its URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Small image rendered in the embed's top-right corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Source URL of the thumbnail.
    pub url: String,
}

impl Thumbnail {
    /// Creates a thumbnail from its URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Name/value pair rendered in the embed's field grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field heading (max 256 characters).
    pub name: String,
    /// Field body (max 1024 characters).
    pub value: String,
    /// Whether the field shares a row with its neighbours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

impl Field {
    /// Creates a block (non-inline) field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), inline: None }
    }

    /// Creates a field rendered inline.
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), inline: Some(true) }
    }
}

/// Structured rich-content block attached to a message.
///
/// # Example
///
/// ```
/// use hookpost_core::{colors, Embed, Field, Footer};
///
/// let embed = Embed::new()
///     .title("Deploy finished")
///     .color(colors::SUCCESS)
///     .field(Field::inline("env", "prod"))
///     .footer(Footer::new("ci"));
///
/// assert!(embed.has_visible_content());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title (max 256 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Embed body (max 4096 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Link attached to the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Sidebar color as a 24-bit RGB integer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// RFC 3339 timestamp rendered in the footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Author line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    /// Footer line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Footer>,
    /// Large image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Corner thumbnail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    /// Field grid entries (max 25).
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Embed {
    /// Creates an empty embed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the title link.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the sidebar color.
    #[must_use]
    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the timestamp from a UTC datetime, formatted with millisecond
    /// precision.
    #[must_use]
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at.to_rfc3339_opts(SecondsFormat::Millis, true));
        self
    }

    /// Sets the timestamp to the current time.
    #[must_use]
    pub fn timestamp_now(self) -> Self {
        self.timestamp(Utc::now())
    }

    /// Sets the timestamp from a raw string. The value is checked by the
    /// validator, not here.
    #[must_use]
    pub fn timestamp_raw(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the author line.
    #[must_use]
    pub fn author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    /// Sets the footer line.
    #[must_use]
    pub fn footer(mut self, footer: Footer) -> Self {
        self.footer = Some(footer);
        self
    }

    /// Sets the large image from its URL.
    #[must_use]
    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(Image::new(url));
        self
    }

    /// Sets the thumbnail from its URL.
    #[must_use]
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(Thumbnail::new(url));
        self
    }

    /// Appends a single field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends several fields in order.
    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Returns true when the embed renders something a reader can see.
    ///
    /// `url`, `color` and `timestamp` alone do not count, nor do an empty
    /// title or description.
    pub fn has_visible_content(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
            || self.description.as_deref().is_some_and(|d| !d.is_empty())
            || !self.fields.is_empty()
            || self.author.is_some()
            || self.footer.is_some()
            || self.image.is_some()
            || self.thumbnail.is_some()
    }
}
