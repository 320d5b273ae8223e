//! HTTP transport for webhook requests with rate-limit handling.
//!
//! A [`Transport`] sends one logical request per call. When the provider
//! answers 429 it waits for the requested time and re-issues the identical
//! request, up to the policy's retry ceiling. Every other outcome is final:
//! 2xx responses return the parsed body, anything else becomes a typed
//! [`WebhookError::Request`].

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use hookpost_core::Clock;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::{
    error::{Result, WebhookError, UNKNOWN_ERROR_CODE},
    retry::{RateLimitPolicy, RetryDecision},
};

/// Configuration for the underlying HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout for a single HTTP attempt.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Maximum number of redirects to follow.
    pub max_redirects: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            user_agent: crate::DEFAULT_USER_AGENT.to_string(),
            max_redirects: 3,
        }
    }
}

/// Body of a webhook request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body (deletes).
    #[default]
    Empty,
    /// Pre-serialized JSON document.
    Json(Bytes),
    /// File upload with an optional JSON payload part.
    Multipart(MultipartBody),
}

/// File attachment upload.
///
/// Kept as plain data so the form can be rebuilt for every attempt; a
/// reqwest `Form` is consumed when sent.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    /// Name the provider shows for the attachment.
    pub file_name: String,
    /// File contents.
    pub file: Bytes,
    /// Serialized message sent alongside the file as `payload_json`.
    pub payload_json: Option<String>,
}

impl MultipartBody {
    fn to_form(&self) -> Form {
        let file = Part::stream_with_length(
            reqwest::Body::from(self.file.clone()),
            self.file.len() as u64,
        )
        .file_name(self.file_name.clone());

        let form = Form::new().part("files[0]", file);
        match &self.payload_json {
            Some(payload) => form.text("payload_json", payload.clone()),
            None => form,
        }
    }
}

/// One logical request against the webhook.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// HTTP method.
    pub method: Method,
    /// Suffix appended to the webhook base address, e.g. `/messages/42`.
    pub path: Option<String>,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: RequestBody,
}

impl WebhookRequest {
    /// Creates a request with no path, query, headers or body.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            path: None,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Sets the path suffix.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Serializes `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Request` if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value).map_err(WebhookError::unknown)?;
        self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = RequestBody::Json(Bytes::from(bytes));
        Ok(self)
    }

    /// Sets a multipart body.
    #[must_use]
    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }
}

/// Final (non-429) successful response.
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Parsed body; `Null` when empty, a JSON string when not JSON.
    pub body: Value,
    /// Number of rate-limit retries it took.
    pub rate_limit_retries: u32,
    /// Total time including backoff waits.
    pub duration: Duration,
}

/// Sends requests to one webhook's base address.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    base_url: String,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl Transport {
    /// Creates a transport for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Configuration` if the HTTP client cannot be
    /// built with the provided settings.
    pub fn new(
        base_url: impl Into<String>,
        config: &ClientConfig,
        policy: RateLimitPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects as usize))
            .build()
            .map_err(|e| {
                WebhookError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, base_url: base_url.into(), policy, clock })
    }

    /// Returns the rate-limit policy in effect.
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Sends one logical request, transparently retrying on 429.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Request` for network failures, non-success
    /// responses, and 429 responses once the retry ceiling is reached.
    pub async fn send(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
        let span = info_span!(
            "webhook_request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            path = request.path.as_deref().unwrap_or("/"),
        );

        async move {
            let start = self.clock.now();
            let mut retries = 0_u32;

            loop {
                let response =
                    self.build(request).send().await.map_err(|e| classify_send_error(&e))?;
                let status = response.status();
                let headers = response.headers().clone();
                let body = read_body(response).await?;

                if status == StatusCode::TOO_MANY_REQUESTS {
                    match self.policy.decide(retries, &headers, &body) {
                        RetryDecision::Retry { wait } => {
                            retries += 1;
                            tracing::warn!(
                                retry = retries,
                                max_retries = self.policy.max_retries,
                                wait_ms = wait.as_millis(),
                                "rate limited, retrying"
                            );
                            self.clock.sleep(wait).await;
                            continue;
                        },
                        RetryDecision::GiveUp => {
                            tracing::warn!(retries, "rate limit retries exhausted");
                            return Err(response_error(status, &body));
                        },
                    }
                }

                let duration = self.clock.now().duration_since(start);

                if !status.is_success() {
                    tracing::warn!(
                        status = status.as_u16(),
                        duration_ms = duration.as_millis(),
                        "webhook request rejected"
                    );
                    return Err(response_error(status, &body));
                }

                tracing::debug!(
                    status = status.as_u16(),
                    retries,
                    duration_ms = duration.as_millis(),
                    "webhook request succeeded"
                );

                return Ok(WebhookResponse {
                    status_code: status.as_u16(),
                    body,
                    rate_limit_retries: retries,
                    duration,
                });
            }
        }
        .instrument(span)
        .await
    }

    fn build(&self, request: &WebhookRequest) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, request.path.as_deref().unwrap_or(""));

        let mut builder =
            self.client.request(request.method.clone(), url).headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(multipart) => builder.multipart(multipart.to_form()),
        }
    }
}

async fn read_body(response: reqwest::Response) -> Result<Value> {
    let bytes = response.bytes().await.map_err(|e| classify_send_error(&e))?;
    Ok(parse_body(&bytes))
}

/// Parses a response body; non-JSON text is kept as a JSON string.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Maps a non-success response to a request error.
///
/// The provider's JSON error body (`{"message": ..., "code": ...}`) supplies
/// the message and code when present.
fn response_error(status: StatusCode, body: &Value) -> WebhookError {
    let provider_message = body.get("message").and_then(Value::as_str).map(str::to_string);

    let code = match body.get("code") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ if status.is_client_error() => "BAD_REQUEST".to_string(),
        _ if status.is_server_error() => "BAD_RESPONSE".to_string(),
        _ => UNKNOWN_ERROR_CODE.to_string(),
    };

    let detail = match (&provider_message, body) {
        (Some(message), _) => message.clone(),
        (None, Value::String(text)) if !text.is_empty() => text.clone(),
        _ => status.canonical_reason().unwrap_or("unexpected response").to_string(),
    };

    WebhookError::request(
        format!("Request Error: [{}] - {detail}", status.as_u16()),
        Some(status.as_u16()),
        provider_message,
        code,
    )
}

/// Maps a transport-level failure (no usable response) to a request error.
fn classify_send_error(error: &reqwest::Error) -> WebhookError {
    let code = if error.is_timeout() {
        "TIMEOUT"
    } else if error.is_connect() {
        "CONNECTION_FAILED"
    } else if error.is_request() || error.is_body() || error.is_decode() {
        "REQUEST_FAILED"
    } else {
        return WebhookError::unknown(error);
    };

    tracing::warn!(code, "webhook request failed: {}", error);
    WebhookError::request(
        format!("Request Error: [{code}] - {error}"),
        error.status().map(|s| s.as_u16()),
        None,
        code,
    )
}
