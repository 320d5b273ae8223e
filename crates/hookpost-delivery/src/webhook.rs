//! Delivery orchestrator for one webhook.
//!
//! The [`Webhook`] owns an ordered queue of messages. `send_all` validates
//! the whole queue before sending anything, then delivers each message in
//! order and keeps only the failures queued.

use std::{path::Path, sync::Arc};

use bytes::Bytes;
use hookpost_core::{
    colors, validate_message, Clock, Embed, Message, MessageId, RealClock, ValidationIssue,
};
use http::Method;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    client::{MultipartBody, Transport, WebhookRequest},
    config::WebhookConfig,
    endpoint::{message_path, WebhookEndpoint},
    error::{BatchFailure, Result, WebhookError},
};

const EDIT_TARGET_REASON: &str = "must be a message id or a message link ending in one";
const FALLBACK_FILE_NAME: &str = "file";

/// Client for a single provider webhook.
#[derive(Debug)]
pub struct Webhook {
    endpoint: WebhookEndpoint,
    transport: Transport,
    queue: Vec<Message>,
    wait: bool,
}

impl Webhook {
    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Configuration` if `url` does not end in
    /// `/{id}/{token}`.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_config(url, &WebhookConfig::default())
    }

    /// Creates a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Configuration` if `url` is not a webhook URL or
    /// `config` is invalid.
    pub fn with_config(url: &str, config: &WebhookConfig) -> Result<Self> {
        Self::with_clock(url, config, Arc::new(RealClock::new()))
    }

    /// Creates a client that waits out rate limits through `clock`.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Configuration` if `url` is not a webhook URL or
    /// `config` is invalid.
    pub fn with_clock(url: &str, config: &WebhookConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let endpoint = WebhookEndpoint::parse(url)?;
        config.validate().map_err(|e| WebhookError::configuration(format!("{e:#}")))?;

        let transport = Transport::new(
            endpoint.base_url(&config.api_base),
            &config.to_client_config(),
            config.to_rate_limit_policy(),
            clock,
        )?;

        debug!(webhook_id = endpoint.id(), api_base = %config.api_base, "webhook client created");

        Ok(Self { endpoint, transport, queue: Vec::new(), wait: config.wait })
    }

    /// Returns the parsed endpoint.
    pub fn endpoint(&self) -> &WebhookEndpoint {
        &self.endpoint
    }

    /// Appends a message to the queue. No validation happens here.
    pub fn enqueue(&mut self, message: Message) -> &mut Self {
        self.queue.push(message);
        self
    }

    /// Removes every queued message.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Returns the JSON payload of each queued message, in queue order.
    pub fn peek_payloads(&self) -> Vec<Value> {
        self.queue.iter().map(Message::payload).collect()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Sends every queued message in order.
    ///
    /// Every message is validated first; if any is invalid nothing is sent
    /// and the queue is left as it was. Otherwise each message is sent in
    /// turn. Sent messages leave the queue, failed ones stay in their
    /// original order.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Validation` naming the first invalid message,
    /// or `WebhookError::Batch` listing every message that failed to send.
    #[instrument(skip(self), fields(webhook_id = self.endpoint.id(), queued = self.queue.len()))]
    pub async fn send_all(&mut self) -> Result<()> {
        for (index, message) in self.queue.iter().enumerate() {
            preflight(message, || format!("message {index} failed validation"))?;
        }

        let pending = std::mem::take(&mut self.queue);
        let mut failures = Vec::new();

        for (index, message) in pending.into_iter().enumerate() {
            match self.deliver(&message).await {
                Ok(_) => debug!(index, "queued message sent"),
                Err(error) => {
                    warn!(index, code = error.code(), "queued message failed: {}", error);
                    failures.push(BatchFailure { index, error: Box::new(error) });
                    self.queue.push(message);
                },
            }
        }

        if failures.is_empty() {
            info!("all queued messages sent");
            Ok(())
        } else {
            warn!(failed = failures.len(), "batch finished with failures");
            Err(WebhookError::batch(failures))
        }
    }

    /// Validates and sends one message, bypassing the queue.
    ///
    /// Messages with an edit target update that message instead of creating
    /// a new one. Returns the provider's response body (`Null` when empty).
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Validation` for an invalid message and
    /// `WebhookError::Request` when delivery fails.
    pub async fn send(&self, message: &Message) -> Result<Value> {
        preflight(message, || "message failed validation".to_string())?;
        self.deliver(message).await
    }

    /// Uploads a file, optionally with a message.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::FileSystem` if the file cannot be read,
    /// `WebhookError::Validation` for an invalid message and
    /// `WebhookError::Request` when delivery fails.
    #[instrument(
        skip_all,
        fields(webhook_id = self.endpoint.id(), path = %path.as_ref().display())
    )]
    pub async fn send_file(
        &self,
        path: impl AsRef<Path>,
        message: Option<&Message>,
    ) -> Result<Value> {
        let path = path.as_ref();
        let contents =
            tokio::fs::read(path).await.map_err(|e| WebhookError::file_system(path, &e))?;

        let payload_json = match message {
            Some(message) => {
                preflight(message, || "attachment message failed validation".to_string())?;
                Some(serde_json::to_string(message).map_err(WebhookError::unknown)?)
            },
            None => None,
        };

        let file_name = path
            .file_name()
            .map_or_else(|| FALLBACK_FILE_NAME.to_string(), |n| n.to_string_lossy().into_owned());

        debug!(file_name = %file_name, bytes = contents.len(), "uploading attachment");

        let request = self.create_request().multipart(MultipartBody {
            file_name,
            file: Bytes::from(contents),
            payload_json,
        });

        Ok(self.transport.send(&request).await?.body)
    }

    /// Deletes a previously sent message.
    ///
    /// Accepts a bare id or a message link. Input without a trailing numeric
    /// segment is used as the id unchanged.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Request` when the provider rejects the delete
    /// or the request fails.
    #[instrument(skip(self), fields(webhook_id = self.endpoint.id()))]
    pub async fn delete(&self, id_or_link: &str) -> Result<()> {
        let id = MessageId::from_link_or_raw(id_or_link);
        let request = WebhookRequest::new(Method::DELETE).path(message_path(&id));

        self.transport.send(&request).await?;
        info!(message_id = %id, "message deleted");
        Ok(())
    }

    /// Sends a blue informational notice.
    ///
    /// # Errors
    ///
    /// Same as [`Webhook::send`].
    pub async fn info(&self, title: &str, description: Option<&str>) -> Result<Value> {
        self.notice(colors::INFO, title, description).await
    }

    /// Sends a green success notice.
    ///
    /// # Errors
    ///
    /// Same as [`Webhook::send`].
    pub async fn success(&self, title: &str, description: Option<&str>) -> Result<Value> {
        self.notice(colors::SUCCESS, title, description).await
    }

    /// Sends a yellow warning notice.
    ///
    /// # Errors
    ///
    /// Same as [`Webhook::send`].
    pub async fn warning(&self, title: &str, description: Option<&str>) -> Result<Value> {
        self.notice(colors::WARNING, title, description).await
    }

    /// Sends a red error notice.
    ///
    /// # Errors
    ///
    /// Same as [`Webhook::send`].
    pub async fn error(&self, title: &str, description: Option<&str>) -> Result<Value> {
        self.notice(colors::ERROR, title, description).await
    }

    async fn notice(&self, color: u32, title: &str, description: Option<&str>) -> Result<Value> {
        let mut embed = Embed::new().title(title).color(color);
        if let Some(description) = description {
            embed = embed.description(description);
        }
        self.send(&Message::new().embed(embed)).await
    }

    /// Sends an already validated message.
    async fn deliver(&self, message: &Message) -> Result<Value> {
        let request = match edit_target_id(message) {
            Some(Ok(id)) => {
                WebhookRequest::new(Method::PATCH).path(message_path(&id)).json(message)?
            },
            Some(Err(issue)) => {
                return Err(WebhookError::Validation {
                    message: "message failed validation".to_string(),
                    issues: vec![issue],
                })
            },
            None => self.create_request().json(message)?,
        };

        Ok(self.transport.send(&request).await?.body)
    }

    fn create_request(&self) -> WebhookRequest {
        let request = WebhookRequest::new(Method::POST);
        if self.wait {
            request.query("wait", "true")
        } else {
            request
        }
    }
}

/// Runs every pre-send check on `message`.
fn preflight(message: &Message, context: impl FnOnce() -> String) -> Result<()> {
    let mut issues = match validate_message(message) {
        Ok(()) => Vec::new(),
        Err(report) => report.into_issues(),
    };
    if let Some(Err(issue)) = edit_target_id(message) {
        issues.push(issue);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(WebhookError::Validation { message: context(), issues })
    }
}

fn edit_target_id(message: &Message) -> Option<std::result::Result<MessageId, ValidationIssue>> {
    message.edit_target.as_deref().map(|target| {
        MessageId::from_link(target)
            .ok_or_else(|| ValidationIssue::new("edit_target", EDIT_TARGET_REASON))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hookpost_core::TestClock;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ErrorKind;

    const URL: &str = "https://discord.com/api/webhooks/42/secret-token";
    const BASE: &str = "/webhooks/42/secret-token";

    fn webhook(server: &MockServer, clock: &TestClock) -> Webhook {
        let config = WebhookConfig { api_base: server.uri(), ..Default::default() };
        Webhook::with_clock(URL, &config, Arc::new(clock.clone())).unwrap()
    }

    #[test]
    fn short_url_is_configuration_error() {
        let error = Webhook::new("token-only").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn invalid_config_is_configuration_error() {
        let config = WebhookConfig { timeout_seconds: 0, ..Default::default() };
        let error = Webhook::with_config(URL, &config).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn queue_inspection_does_not_mutate() {
        let mut hook = Webhook::new(URL).unwrap();
        hook.enqueue(Message::text("one")).enqueue(
            Message::new().username("bot").embed(Embed::new().title("T").color(colors::INFO)),
        );

        let payloads = hook.peek_payloads();

        assert_eq!(
            payloads,
            vec![
                json!({ "content": "one" }),
                json!({
                    "username": "bot",
                    "embeds": [{ "title": "T", "color": 3447003, "fields": [] }]
                }),
            ]
        );
        assert_eq!(hook.len(), 2);
        assert_eq!(hook.peek_payloads(), payloads);

        hook.clear();
        assert!(hook.is_empty());
    }

    #[tokio::test]
    async fn invalid_message_blocks_whole_batch() {
        let server = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let clock = TestClock::new();
        let mut hook = webhook(&server, &clock);
        hook.enqueue(Message::text("fine"))
            .enqueue(Message::text("x".repeat(2001)))
            .enqueue(Message::text("also fine"));

        let error = hook.send_all().await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert!(error.to_string().starts_with("message 1 failed validation"));
        assert_eq!(error.issues()[0].path, "content");
        assert_eq!(hook.len(), 3);
    }

    #[tokio::test]
    async fn edit_target_link_becomes_patch() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("PATCH"))
            .and(matchers::path(format!("{BASE}/messages/123456789")))
            .and(matchers::body_json(json!({ "content": "edited" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "123456789" })))
            .expect(1)
            .mount(&server)
            .await;

        let clock = TestClock::new();
        let hook = webhook(&server, &clock);
        let message =
            Message::text("edited").edit_target("https://discord.com/channels/1/2/123456789");

        let body = hook.send(&message).await.unwrap();
        assert_eq!(body["id"], "123456789");
    }

    #[tokio::test]
    async fn non_numeric_edit_target_rejected_before_sending() {
        let server = MockServer::start().await;
        let clock = TestClock::new();
        let hook = webhook(&server, &clock);

        let message = Message::text("x").edit_target("https://example.com/oops");
        let error = hook.send(&message).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.issues()[0].path, "edit_target");
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn wait_flag_adds_query() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path(BASE))
            .and(matchers::query_param("wait", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1" })))
            .expect(1)
            .mount(&server)
            .await;

        let config = WebhookConfig { api_base: server.uri(), wait: true, ..Default::default() };
        let hook = Webhook::with_clock(URL, &config, Arc::new(TestClock::new())).unwrap();

        hook.send(&Message::text("hi")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_uses_raw_input_without_numeric_suffix() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("DELETE"))
            .and(matchers::path(format!("{BASE}/messages/not-a-number")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let clock = TestClock::new();
        webhook(&server, &clock).delete("not-a-number").await.unwrap();
    }

    #[tokio::test]
    async fn notice_uses_fixed_color() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_json(json!({
                "embeds": [{
                    "title": "Deploy failed",
                    "description": "see logs",
                    "color": colors::ERROR,
                    "fields": []
                }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let clock = TestClock::new();
        let body = webhook(&server, &clock).error("Deploy failed", Some("see logs")).await.unwrap();
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn missing_attachment_is_file_system_error() {
        let server = MockServer::start().await;
        let clock = TestClock::new();
        let hook = webhook(&server, &clock);

        let error = hook.send_file("/definitely/not/here.bin", None).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::FileSystem);
        assert!(clock.sleeps().is_empty());
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
