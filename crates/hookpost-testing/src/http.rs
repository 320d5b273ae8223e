//! Mock webhook provider for delivery tests.
//!
//! Wraps a wiremock server that answers on the webhook paths the client
//! uses and records every request it receives together with its arrival
//! time, so tests can assert ordering, bodies and retry spacing.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use bytes::Bytes;
use http::{HeaderMap, Method};
use serde_json::{json, Value};
use wiremock::{
    matchers::{any, method, path},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

/// Webhook id every mock provider serves.
pub const WEBHOOK_ID: &str = "1029384756";

/// Webhook token every mock provider serves.
pub const WEBHOOK_TOKEN: &str = "test-token_abc123";

/// A request received by the mock provider.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Path below the server root, e.g. `/webhooks/1/t/messages/9`.
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Bytes,
    /// When the request arrived.
    pub received_at: Instant,
}

impl RecordedRequest {
    /// Parses the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }

    /// Body as lossy UTF-8, for multipart assertions.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

type Log = Arc<Mutex<Vec<RecordedRequest>>>;

/// Responder that logs each request before answering.
struct Recording {
    log: Log,
    response: ResponseTemplate,
}

impl Respond for Recording {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let recorded = RecordedRequest {
            method: request.method.clone(),
            path: request.url.path().to_string(),
            query: request.url.query().map(str::to_string),
            headers: request.headers.clone(),
            body: Bytes::from(request.body.clone()),
            received_at: Instant::now(),
        };
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(recorded);
        self.response.clone()
    }
}

/// A canned provider reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with a JSON body.
    Json(Value),
    /// 204 with no body.
    NoContent,
    /// 429 with optional `retry-after` header and the provider's JSON body.
    RateLimited {
        /// Raw `retry-after` header value
        retry_after: Option<String>,
    },
    /// Provider error with `{"message", "code"}` body.
    Error {
        /// HTTP status
        status: u16,
        /// Provider error message
        message: String,
        /// Provider error code
        code: u64,
    },
    /// Arbitrary status and plain-text body.
    Raw {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },
}

impl MockReply {
    /// 200 with a created-message body carrying `id`.
    pub fn created(id: &str) -> Self {
        Self::Json(json!({ "id": id, "type": 0 }))
    }

    /// 429 with `retry-after` set to `seconds`.
    pub fn rate_limited(seconds: &str) -> Self {
        Self::RateLimited { retry_after: Some(seconds.to_string()) }
    }

    fn template(&self) -> ResponseTemplate {
        match self {
            Self::Json(body) => ResponseTemplate::new(200).set_body_json(body),
            Self::NoContent => ResponseTemplate::new(204),
            Self::RateLimited { retry_after } => {
                let template = ResponseTemplate::new(429).set_body_json(json!({
                    "message": "You are being rate limited.",
                    "global": false
                }));
                match retry_after {
                    Some(value) => template.insert_header("retry-after", value.as_str()),
                    None => template,
                }
            },
            Self::Error { status, message, code } => ResponseTemplate::new(*status)
                .set_body_json(json!({ "message": message, "code": code })),
            Self::Raw { status, body } => ResponseTemplate::new(*status).set_body_string(body),
        }
    }
}

/// Mock provider serving one webhook.
pub struct MockProvider {
    server: MockServer,
    log: Log,
}

impl MockProvider {
    /// Starts a provider on a random local port.
    ///
    /// Requests no mounted reply matches are still recorded and get a 404.
    pub async fn start() -> Self {
        let provider =
            Self { server: MockServer::start().await, log: Arc::new(Mutex::new(Vec::new())) };

        Mock::given(any())
            .respond_with(Recording {
                log: Arc::clone(&provider.log),
                response: ResponseTemplate::new(404)
                    .set_body_json(json!({ "message": "Unknown Webhook", "code": 10015 })),
            })
            .with_priority(u8::MAX)
            .mount(&provider.server)
            .await;

        provider
    }

    /// API base the client should be configured with.
    pub fn api_base(&self) -> String {
        self.server.uri()
    }

    /// A provider-style webhook URL for the served webhook.
    pub fn webhook_url(&self) -> String {
        format!("https://discord.com/api/webhooks/{WEBHOOK_ID}/{WEBHOOK_TOKEN}")
    }

    /// Path of the webhook base address on this server.
    pub fn webhook_path(&self) -> String {
        format!("/webhooks/{WEBHOOK_ID}/{WEBHOOK_TOKEN}")
    }

    /// Path addressing message `id` on this server.
    pub fn message_path(&self, id: &str) -> String {
        format!("{}/messages/{id}", self.webhook_path())
    }

    /// Answers every `method` request on `route` with `reply`.
    pub async fn on(&self, method_name: Method, route: impl Into<String>, reply: MockReply) {
        self.mount(method_name, route.into(), reply, None).await;
    }

    /// Answers message creation with 200 and a created-message body.
    pub async fn accept_messages(&self) {
        self.on(Method::POST, self.webhook_path(), MockReply::created("1")).await;
    }

    /// Starts a sequence of one-shot replies to message creation.
    pub fn sequence(&self) -> ReplySequence<'_> {
        self.sequence_for(Method::POST, self.webhook_path())
    }

    /// Starts a sequence of one-shot replies for `method` on `route`.
    pub fn sequence_for(
        &self,
        method_name: Method,
        route: impl Into<String>,
    ) -> ReplySequence<'_> {
        ReplySequence {
            provider: self,
            method: method_name,
            route: route.into(),
            replies: Vec::new(),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn received_requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Asserts exactly `expected` requests were received.
    ///
    /// # Panics
    ///
    /// Panics on a count mismatch.
    pub fn assert_request_count(&self, expected: usize) {
        let received = self.received_requests().len();
        assert_eq!(received, expected, "expected {expected} requests, received {received}");
    }

    /// Gaps between consecutive request arrivals.
    pub fn arrival_gaps(&self) -> Vec<Duration> {
        let requests = self.received_requests();
        requests.windows(2).map(|w| w[1].received_at.duration_since(w[0].received_at)).collect()
    }

    async fn mount(
        &self,
        method_name: Method,
        route: String,
        reply: MockReply,
        times: Option<u64>,
    ) {
        let mut mock = Mock::given(method(method_name.as_str()))
            .and(path(route))
            .respond_with(Recording { log: Arc::clone(&self.log), response: reply.template() });
        if let Some(times) = times {
            mock = mock.up_to_n_times(times);
        }
        mock.mount(&self.server).await;
    }
}

/// Ordered one-shot replies; request `n` receives reply `n`.
pub struct ReplySequence<'a> {
    provider: &'a MockProvider,
    method: Method,
    route: String,
    replies: Vec<MockReply>,
}

impl ReplySequence<'_> {
    /// Appends a reply.
    #[must_use]
    pub fn then(mut self, reply: MockReply) -> Self {
        self.replies.push(reply);
        self
    }

    /// Mounts the replies in order.
    pub async fn mount(self) {
        for reply in self.replies {
            self.provider.mount(self.method.clone(), self.route.clone(), reply, Some(1)).await;
        }
    }
}

/// Multipart body assertions.
pub mod assertions {
    use super::RecordedRequest;

    /// Asserts the request is multipart and contains a part named `name`.
    ///
    /// # Panics
    ///
    /// Panics when the content type is not multipart or the part is absent.
    pub fn assert_multipart_part(request: &RecordedRequest, name: &str) {
        let content_type = request.header("content-type").unwrap_or_default();
        assert!(
            content_type.starts_with("multipart/form-data"),
            "expected multipart body, got content-type {content_type:?}"
        );
        let needle = format!("name=\"{name}\"");
        assert!(request.text().contains(&needle), "multipart part {name:?} missing");
    }
}
