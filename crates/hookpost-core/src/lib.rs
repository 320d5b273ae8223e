//! Message model and payload validation for webhook delivery.
//!
//! Provides the data structures a caller assembles (messages, embeds and
//! their components), the pure pre-flight validator that checks them against
//! provider limits, and the clock abstraction the delivery crate waits
//! through. Nothing in this crate performs I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod colors;
pub mod embed;
pub mod ids;
pub mod message;
pub mod time;
pub mod validation;

pub use embed::{Author, Embed, Field, Footer, Image, Thumbnail};
pub use ids::MessageId;
pub use message::Message;
pub use time::{Clock, RealClock, TestClock};
pub use validation::{validate_message, ValidationIssue, ValidationReport};
