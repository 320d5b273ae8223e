//! Layered client configuration.
//!
//! Configuration is loaded in priority order:
//! 1. Environment variables prefixed `HOOKPOST_` (highest priority)
//! 2. Configuration file (`hookpost.toml`)
//! 3. Built-in defaults (lowest priority)
//!
//! The client works out-of-the-box against the provider's public API with
//! the defaults; tests and proxies override `api_base`.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{client::ClientConfig, endpoint::DEFAULT_API_BASE, retry::RateLimitPolicy};

const CONFIG_FILE: &str = "hookpost.toml";
const ENV_PREFIX: &str = "HOOKPOST_";

/// Settings shared by every webhook client built from this configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// API base requests are sent to.
    ///
    /// Environment variable: `HOOKPOST_API_BASE`
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Timeout for a single HTTP attempt in seconds.
    ///
    /// Environment variable: `HOOKPOST_TIMEOUT_SECONDS`
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User agent sent with every request.
    ///
    /// Environment variable: `HOOKPOST_USER_AGENT`
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Retries of one request after 429 responses before giving up.
    ///
    /// Environment variable: `HOOKPOST_MAX_RATE_LIMIT_RETRIES`
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,

    /// Wait used when a 429 carries no usable hint, in milliseconds.
    ///
    /// Environment variable: `HOOKPOST_DEFAULT_RETRY_AFTER_MS`
    #[serde(default = "default_retry_after_ms")]
    pub default_retry_after_ms: u64,

    /// Ask the provider to return the created message (`?wait=true`).
    ///
    /// Environment variable: `HOOKPOST_WAIT`
    #[serde(default)]
    pub wait: bool,
}

impl WebhookConfig {
    /// Loads configuration from defaults, `hookpost.toml` in the working
    /// directory, and `HOOKPOST_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged values
    /// fail validation.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Like [`WebhookConfig::load`] with an explicit configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the merged values
    /// fail validation.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment.extract().context("failed to load webhook configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Converts to HTTP client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
            ..ClientConfig::default()
        }
    }

    /// Converts to the rate-limit retry policy.
    pub fn to_rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_retries: self.max_rate_limit_retries,
            default_retry_after: Duration::from_millis(self.default_retry_after_ms),
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        let api_base = url::Url::parse(&self.api_base)
            .with_context(|| format!("api_base is not a valid URL: {}", self.api_base))?;
        if !matches!(api_base.scheme(), "http" | "https") {
            anyhow::bail!("api_base must use http or https, got {}", api_base.scheme());
        }

        if self.timeout_seconds == 0 {
            anyhow::bail!("timeout_seconds must be greater than 0");
        }

        if self.user_agent.trim().is_empty() {
            anyhow::bail!("user_agent must not be empty");
        }

        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            default_retry_after_ms: default_retry_after_ms(),
            wait: false,
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_seconds() -> u64 {
    crate::DEFAULT_TIMEOUT_SECONDS
}

fn default_user_agent() -> String {
    crate::DEFAULT_USER_AGENT.to_string()
}

fn default_max_rate_limit_retries() -> u32 {
    RateLimitPolicy::default().max_retries
}

fn default_retry_after_ms() -> u64 {
    3000
}
