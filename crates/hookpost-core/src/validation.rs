//! Pre-flight validation of message payloads against provider limits.
//!
//! Validation is pure and accumulating: every violated constraint is
//! reported with the dotted path of the offending field, so a caller can fix
//! a message in one pass. A message either passes completely or fails with
//! a non-empty [`ValidationReport`].

use std::fmt;

use chrono::DateTime;
use thiserror::Error;

use crate::{
    embed::{Author, Embed, Footer},
    message::Message,
};

/// Provider limits enforced by the validator.
pub mod limits {
    /// Maximum characters of top-level message content.
    pub const CONTENT_MAX: usize = 2000;
    /// Maximum embeds per message.
    pub const EMBEDS_MAX: usize = 10;
    /// Maximum characters of an embed title.
    pub const TITLE_MAX: usize = 256;
    /// Maximum characters of an embed description.
    pub const DESCRIPTION_MAX: usize = 4096;
    /// Maximum characters of an author name.
    pub const AUTHOR_NAME_MAX: usize = 256;
    /// Maximum characters of footer text.
    pub const FOOTER_TEXT_MAX: usize = 2048;
    /// Maximum fields per embed.
    pub const FIELDS_MAX: usize = 25;
    /// Maximum characters of a field name.
    pub const FIELD_NAME_MAX: usize = 256;
    /// Maximum characters of a field value.
    pub const FIELD_VALUE_MAX: usize = 1024;
    /// Largest embed color (24-bit RGB).
    pub const COLOR_MAX: u32 = crate::colors::MAX;
}

/// Reason attached to the cross-field content check.
pub const EMPTY_MESSAGE_REASON: &str =
    "Message must have content or at least one non-empty embed.";

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending field; empty for message-level issues.
    pub path: String,
    /// Human-readable description of the violation.
    pub reason: String,
}

impl ValidationIssue {
    /// Creates an issue for the given path.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), reason: reason.into() }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// Every issue found in one message. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.summary())]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns the collected issues in discovery order.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consumes the report, yielding its issues.
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Joins all issues as `path: reason; path: reason`.
    pub fn summary(&self) -> String {
        self.issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    }

    /// Returns true if any issue is reported at exactly `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

/// Validates a message against every provider constraint.
///
/// # Errors
///
/// Returns a [`ValidationReport`] listing every violation when the message
/// would be rejected by the provider.
pub fn validate_message(message: &Message) -> Result<(), ValidationReport> {
    let mut issues = Issues::default();

    if let Some(content) = &message.content {
        issues.max_chars("content", content, limits::CONTENT_MAX);
    }
    if let Some(avatar_url) = &message.avatar_url {
        issues.url("avatar_url", avatar_url);
    }

    if message.embeds.len() > limits::EMBEDS_MAX {
        issues.push(
            "embeds",
            format!(
                "must contain at most {} embeds (got {})",
                limits::EMBEDS_MAX,
                message.embeds.len()
            ),
        );
    }
    for (index, embed) in message.embeds.iter().enumerate() {
        validate_embed(&mut issues, &format!("embeds.{index}"), embed);
    }

    let has_content = message.content.as_deref().is_some_and(|c| !c.trim().is_empty());
    let has_visible_embed = message.embeds.iter().any(Embed::has_visible_content);
    if !has_content && !has_visible_embed {
        issues.push("", EMPTY_MESSAGE_REASON);
    }

    issues.finish()
}

impl Message {
    /// Shorthand for [`validate_message`].
    ///
    /// # Errors
    ///
    /// See [`validate_message`].
    pub fn validate(&self) -> Result<(), ValidationReport> {
        validate_message(self)
    }
}

fn validate_embed(issues: &mut Issues, prefix: &str, embed: &Embed) {
    if let Some(title) = &embed.title {
        issues.max_chars(&format!("{prefix}.title"), title, limits::TITLE_MAX);
    }
    if let Some(description) = &embed.description {
        issues.max_chars(&format!("{prefix}.description"), description, limits::DESCRIPTION_MAX);
    }
    if let Some(url) = &embed.url {
        issues.url(&format!("{prefix}.url"), url);
    }
    if let Some(color) = embed.color {
        if color > limits::COLOR_MAX {
            issues.push(
                format!("{prefix}.color"),
                format!("must be between 0 and {} (got {color})", limits::COLOR_MAX),
            );
        }
    }
    if let Some(timestamp) = &embed.timestamp {
        if DateTime::parse_from_rfc3339(timestamp).is_err() {
            issues.push(format!("{prefix}.timestamp"), "must be a valid ISO 8601 datetime");
        }
    }
    if let Some(author) = &embed.author {
        validate_author(issues, &format!("{prefix}.author"), author);
    }
    if let Some(footer) = &embed.footer {
        validate_footer(issues, &format!("{prefix}.footer"), footer);
    }
    if let Some(image) = &embed.image {
        issues.url(&format!("{prefix}.image.url"), &image.url);
    }
    if let Some(thumbnail) = &embed.thumbnail {
        issues.url(&format!("{prefix}.thumbnail.url"), &thumbnail.url);
    }

    if embed.fields.len() > limits::FIELDS_MAX {
        issues.push(
            format!("{prefix}.fields"),
            format!(
                "must contain at most {} fields (got {})",
                limits::FIELDS_MAX,
                embed.fields.len()
            ),
        );
    }
    for (index, field) in embed.fields.iter().enumerate() {
        let path = format!("{prefix}.fields.{index}");
        issues.max_chars(&format!("{path}.name"), &field.name, limits::FIELD_NAME_MAX);
        issues.max_chars(&format!("{path}.value"), &field.value, limits::FIELD_VALUE_MAX);
    }
}

fn validate_author(issues: &mut Issues, prefix: &str, author: &Author) {
    issues.max_chars(&format!("{prefix}.name"), &author.name, limits::AUTHOR_NAME_MAX);
    if let Some(url) = &author.url {
        issues.url(&format!("{prefix}.url"), url);
    }
    if let Some(icon_url) = &author.icon_url {
        issues.url(&format!("{prefix}.icon_url"), icon_url);
    }
}

fn validate_footer(issues: &mut Issues, prefix: &str, footer: &Footer) {
    issues.max_chars(&format!("{prefix}.text"), &footer.text, limits::FOOTER_TEXT_MAX);
    if let Some(icon_url) = &footer.icon_url {
        issues.url(&format!("{prefix}.icon_url"), icon_url);
    }
}

/// Accumulator used while walking a message.
#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.0.push(ValidationIssue::new(path, reason));
    }

    fn max_chars(&mut self, path: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.push(path, format!("must be at most {max} characters (got {len})"));
        }
    }

    fn url(&mut self, path: &str, value: &str) {
        if url::Url::parse(value).is_err() {
            self.push(path, "must be a valid URL");
        }
    }

    fn finish(self) -> Result<(), ValidationReport> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport { issues: self.0 })
        }
    }
}
