//! Test infrastructure for hookpost.
//!
//! Provides a mock webhook provider that records every request, message
//! fixtures, and a [`TestEnv`] wiring a client to the mock with a
//! deterministic clock.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use hookpost_delivery::{Webhook, WebhookConfig};
use tracing_subscriber::EnvFilter;

pub mod fixtures;
pub mod http;

pub use hookpost_core::TestClock;
pub use http::{MockProvider, MockReply, RecordedRequest};

/// Mock provider plus deterministic clock for one test.
pub struct TestEnv {
    /// Mock webhook provider
    pub provider: MockProvider,
    /// Clock every client built by this environment sleeps through
    pub clock: TestClock,
}

impl TestEnv {
    /// Starts a fresh mock provider.
    pub async fn new() -> Self {
        init_tracing();
        Self { provider: MockProvider::start().await, clock: TestClock::new() }
    }

    /// Configuration pointing at the mock provider.
    pub fn config(&self) -> WebhookConfig {
        WebhookConfig { api_base: self.provider.api_base(), ..WebhookConfig::default() }
    }

    /// A client for the mock webhook using the test clock.
    pub fn webhook(&self) -> Result<Webhook> {
        self.webhook_with(self.config())
    }

    /// A client for the mock webhook with custom configuration.
    pub fn webhook_with(&self, config: WebhookConfig) -> Result<Webhook> {
        Webhook::with_clock(&self.provider.webhook_url(), &config, Arc::new(self.clock.clone()))
            .context("failed to build webhook client for mock provider")
    }
}

/// Installs a test-writer tracing subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `warn,hookpost_delivery=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,hookpost_delivery=debug")),
        )
        .with_test_writer()
        .try_init();
}
