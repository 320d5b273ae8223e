//! Message fixtures shared by the test suites.

use hookpost_core::{colors, validation::limits, Author, Embed, Field, Footer, Message};

/// Plain text message numbered `n`.
pub fn text_message(n: usize) -> Message {
    Message::text(format!("message #{n}"))
}

/// Embed with every component set to a valid value.
pub fn full_embed() -> Embed {
    Embed::new()
        .title("Nightly build")
        .description("All 412 tests passed.")
        .url("https://ci.example.com/runs/8812")
        .color(colors::SUCCESS)
        .timestamp_raw("2024-05-01T12:30:00.000Z")
        .author(Author::new("ci-bot").icon_url("https://ci.example.com/bot.png"))
        .footer(Footer::new("pipeline 8812"))
        .image("https://ci.example.com/chart.png")
        .thumbnail("https://ci.example.com/thumb.png")
        .field(Field::inline("duration", "4m 12s"))
        .field(Field::inline("commit", "a1b2c3d"))
}

/// Message with content, overrides and a full embed.
pub fn rich_message() -> Message {
    Message::new()
        .content("Build finished")
        .username("ci-bot")
        .avatar_url("https://ci.example.com/bot.png")
        .embed(full_embed())
}

/// Message whose content is one character over the limit.
pub fn oversized_message() -> Message {
    Message::text("x".repeat(limits::CONTENT_MAX + 1))
}

/// Message with no content and only an embed that renders nothing.
pub fn invisible_message() -> Message {
    Message::new().embed(Embed::new().color(colors::INFO))
}

/// Embed with `n` fields.
pub fn embed_with_fields(n: usize) -> Embed {
    Embed::new().title("fields").fields((0..n).map(|i| Field::new(format!("f{i}"), "v")))
}
