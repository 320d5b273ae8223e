//! Error types for webhook delivery operations.
//!
//! One enum covers every failure a caller can see. Each variant is a
//! distinct kind so callers can tell "my data is wrong" (validation,
//! file system, configuration) apart from "the provider or network failed"
//! (request), and batch sends report every individual failure together.

use std::{fmt, path::PathBuf};

use hookpost_core::{ValidationIssue, ValidationReport};
use thiserror::Error;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Machine code used when a failure has no more specific code.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Every error surfaced by the webhook client.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// Endpoint URL or client settings are unusable.
    #[error("invalid webhook configuration: {message}")]
    Configuration {
        /// What is wrong with the configuration
        message: String,
    },

    /// Payload rejected before any network activity.
    #[error("{message}: {}", format_issues(.issues))]
    Validation {
        /// Which payload failed
        message: String,
        /// Every violated constraint
        issues: Vec<ValidationIssue>,
    },

    /// Network failure or non-success response from the provider.
    #[error("{message}")]
    Request {
        /// Human-readable description
        message: String,
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// The provider's own error message from the response body
        provider_message: Option<String>,
        /// Provider or transport error code
        code: String,
    },

    /// Attachment file could not be read.
    #[error("failed to read attachment {}: {message}", .path.display())]
    FileSystem {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error description
        message: String,
    },

    /// One or more messages in a batch failed to send.
    #[error(
        "{} of the queued messages failed to send: {}",
        .failures.len(),
        format_failures(.failures)
    )]
    Batch {
        /// Each failed message's queue position and error
        failures: Vec<BatchFailure>,
    },
}

/// A single failed send within a batch.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// Position of the message in the queue when the batch started.
    pub index: usize,
    /// Why the send failed.
    pub error: Box<WebhookError>,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message {}: {}", self.index, self.error)
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

fn format_failures(failures: &[BatchFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join(" | ")
}

impl WebhookError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Creates a validation error from a validator report.
    pub fn validation(message: impl Into<String>, report: ValidationReport) -> Self {
        Self::Validation { message: message.into(), issues: report.into_issues() }
    }

    /// Creates a request error.
    pub fn request(
        message: impl Into<String>,
        status: Option<u16>,
        provider_message: Option<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::Request { message: message.into(), status, provider_message, code: code.into() }
    }

    /// Wraps a failure the transport does not recognise, keeping its text.
    pub fn unknown(error: impl fmt::Display) -> Self {
        Self::request(
            format!("An unknown error occurred: {error}"),
            None,
            None,
            UNKNOWN_ERROR_CODE,
        )
    }

    /// Creates a file system error for `path`.
    pub fn file_system(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::FileSystem { path: path.into(), message: error.to_string() }
    }

    /// Creates a batch error from collected failures.
    pub fn batch(failures: Vec<BatchFailure>) -> Self {
        Self::Batch { failures }
    }

    /// Returns the kind discriminant.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from(self)
    }

    /// Returns a stable machine-readable code.
    ///
    /// Request errors carry the provider's or transport's own code; every
    /// other kind maps to a fixed code.
    pub fn code(&self) -> &str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Request { code, .. } => code,
            Self::FileSystem { .. } => "FILE_SYSTEM_ERROR",
            Self::Batch { .. } => "BATCH_ERROR",
        }
    }

    /// HTTP status of the failed response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// Validation issues, for validation errors.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation { issues, .. } => issues,
            _ => &[],
        }
    }

    /// Individual failures, for batch errors.
    pub fn failures(&self) -> &[BatchFailure] {
        match self {
            Self::Batch { failures } => failures,
            _ => &[],
        }
    }
}

/// Kind of webhook error, for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad endpoint URL or client settings.
    Configuration,
    /// Payload failed pre-flight validation.
    Validation,
    /// Network or provider failure.
    Request,
    /// Attachment could not be read.
    FileSystem,
    /// Aggregate of per-message failures.
    Batch,
}

impl From<&WebhookError> for ErrorKind {
    fn from(error: &WebhookError) -> Self {
        match error {
            WebhookError::Configuration { .. } => Self::Configuration,
            WebhookError::Validation { .. } => Self::Validation,
            WebhookError::Request { .. } => Self::Request,
            WebhookError::FileSystem { .. } => Self::FileSystem,
            WebhookError::Batch { .. } => Self::Batch,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Validation => write!(f, "validation"),
            Self::Request => write!(f, "request"),
            Self::FileSystem => write!(f, "file_system"),
            Self::Batch => write!(f, "batch"),
        }
    }
}
