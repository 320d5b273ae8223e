//! Webhook delivery: transport, rate-limit retries and the message queue.
//!
//! A [`Webhook`] owns a queue of messages for one provider webhook. Messages
//! are validated before any network activity, then delivered sequentially
//! through a [`Transport`] that transparently retries rate-limited requests.
//! Failures are typed [`WebhookError`]s; batch sends keep failed messages in
//! the queue so they can be retried.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod retry;
pub mod webhook;

pub use client::{
    ClientConfig, MultipartBody, RequestBody, Transport, WebhookRequest, WebhookResponse,
};
pub use config::WebhookConfig;
pub use endpoint::{WebhookEndpoint, DEFAULT_API_BASE};
pub use error::{BatchFailure, ErrorKind, Result, WebhookError};
pub use retry::{RateLimitPolicy, RetryDecision};
pub use webhook::Webhook;

/// Default timeout for a single HTTP attempt.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("hookpost/", env!("CARGO_PKG_VERSION"));
