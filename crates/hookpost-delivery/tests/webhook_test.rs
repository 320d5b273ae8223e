//! Integration tests for the webhook orchestrator against a mock provider.
//!
//! Covers queue semantics of batch sends, edit and delete routing, file
//! uploads and the convenience notices.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use hookpost_core::{colors, Message};
use hookpost_delivery::{ErrorKind, WebhookConfig, WebhookError};
use hookpost_testing::{
    fixtures,
    http::{assertions::assert_multipart_part, MockReply},
    TestEnv,
};
use http::Method;
use serde_json::{json, Value};

#[tokio::test]
async fn batch_of_valid_messages_sent_in_order() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;

    let mut webhook = env.webhook().expect("client should build");
    for n in 0..3 {
        webhook.enqueue(fixtures::text_message(n));
    }

    webhook.send_all().await.expect("batch should succeed");

    assert!(webhook.is_empty());
    let requests = env.provider.received_requests();
    let contents: Vec<Value> = requests.iter().map(|r| r.json()["content"].clone()).collect();
    assert_eq!(contents, vec![json!("message #0"), json!("message #1"), json!("message #2")]);
    assert!(requests.iter().all(|r| r.method == Method::POST));
}

#[tokio::test]
async fn failed_message_stays_queued_and_others_still_sent() {
    let env = TestEnv::new().await;
    env.provider
        .sequence()
        .then(MockReply::created("10"))
        .then(MockReply::Raw { status: 502, body: "bad gateway".into() })
        .then(MockReply::created("12"))
        .mount()
        .await;

    let mut webhook = env.webhook().expect("client should build");
    webhook
        .enqueue(Message::text("A"))
        .enqueue(Message::text("B"))
        .enqueue(Message::text("C"));

    let error = webhook.send_all().await.expect_err("batch should report B");

    env.provider.assert_request_count(3);
    assert_eq!(webhook.peek_payloads(), vec![json!({ "content": "B" })]);

    match &error {
        WebhookError::Batch { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].index, 1);
            assert_eq!(failures[0].error.status(), Some(502));
        },
        other => panic!("expected batch error, got {other:?}"),
    }
    assert!(error.to_string().contains("message 1: Request Error: [502] - bad gateway"));

    env.provider.accept_messages().await;
    webhook.send_all().await.expect("retrying the remaining message should succeed");
    assert!(webhook.is_empty());
}

#[tokio::test]
async fn every_failure_reported_in_queue_order() {
    let env = TestEnv::new().await;
    env.provider
        .sequence()
        .then(MockReply::Error { status: 400, message: "Invalid Form Body".into(), code: 50035 })
        .then(MockReply::created("2"))
        .then(MockReply::Error { status: 403, message: "Missing Access".into(), code: 50001 })
        .mount()
        .await;

    let mut webhook = env.webhook().expect("client should build");
    webhook
        .enqueue(Message::text("first"))
        .enqueue(Message::text("second"))
        .enqueue(Message::text("third"));

    let error = webhook.send_all().await.unwrap_err();

    let indexes: Vec<usize> = error.failures().iter().map(|f| f.index).collect();
    let codes: Vec<&str> = error.failures().iter().map(|f| f.error.code()).collect();
    assert_eq!(indexes, vec![0, 2]);
    assert_eq!(codes, vec!["50035", "50001"]);
    assert_eq!(
        webhook.peek_payloads(),
        vec![json!({ "content": "first" }), json!({ "content": "third" })]
    );
}

#[tokio::test]
async fn invalid_queue_produces_no_requests() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;

    let mut webhook = env.webhook().expect("client should build");
    webhook
        .enqueue(fixtures::rich_message())
        .enqueue(fixtures::invisible_message())
        .enqueue(fixtures::oversized_message());

    let error = webhook.send_all().await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(error.to_string().starts_with("message 1 failed validation"));
    assert_eq!(error.issues()[0].path, "");
    assert_eq!(webhook.len(), 3);
    env.provider.assert_request_count(0);
}

#[tokio::test]
async fn clear_then_send_all_is_a_no_op() {
    let env = TestEnv::new().await;
    let mut webhook = env.webhook().expect("client should build");
    webhook.enqueue(fixtures::text_message(1));
    webhook.clear();

    webhook.send_all().await.expect("empty batch succeeds");
    env.provider.assert_request_count(0);
}

#[tokio::test]
async fn edit_target_link_patches_message() {
    let env = TestEnv::new().await;
    env.provider
        .on(Method::PATCH, env.provider.message_path("123456789"), MockReply::created("123456789"))
        .await;

    let webhook = env.webhook().expect("client should build");
    let message = Message::text("updated status")
        .edit_target("https://discord.com/channels/111/222/123456789");

    let body = webhook.send(&message).await.expect("edit should succeed");

    assert_eq!(body["id"], "123456789");
    let requests = env.provider.received_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::PATCH);
    assert_eq!(requests[0].json(), json!({ "content": "updated status" }));
}

#[tokio::test]
async fn bare_numeric_edit_target_accepted() {
    let env = TestEnv::new().await;
    env.provider.on(Method::PATCH, env.provider.message_path("42"), MockReply::NoContent).await;

    let webhook = env.webhook().expect("client should build");
    webhook.send(&Message::text("x").edit_target("42")).await.expect("edit should succeed");

    env.provider.assert_request_count(1);
}

#[tokio::test]
async fn delete_by_link_and_by_raw_input() {
    let env = TestEnv::new().await;
    let raw = "not-a-number-suffixed-link";
    env.provider.on(Method::DELETE, env.provider.message_path("987"), MockReply::NoContent).await;
    env.provider.on(Method::DELETE, env.provider.message_path(raw), MockReply::NoContent).await;

    let webhook = env.webhook().expect("client should build");
    webhook.delete("https://discord.com/channels/1/2/987").await.expect("delete by link");
    webhook.delete(raw).await.expect("delete by raw input");

    let paths: Vec<String> =
        env.provider.received_requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![env.provider.message_path("987"), env.provider.message_path(raw)]
    );
}

#[tokio::test]
async fn delete_of_unknown_message_is_request_error() {
    let env = TestEnv::new().await;
    env.provider
        .on(
            Method::DELETE,
            env.provider.message_path("5"),
            MockReply::Error { status: 404, message: "Unknown Message".into(), code: 10008 },
        )
        .await;

    let webhook = env.webhook().expect("client should build");
    let error = webhook.delete("5").await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Request);
    assert_eq!(error.status(), Some(404));
    assert_eq!(error.code(), "10008");
}

#[tokio::test]
async fn file_upload_with_payload_is_multipart() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("report.txt");
    std::fs::write(&file, "nightly report contents").unwrap();

    let webhook = env.webhook().expect("client should build");
    webhook
        .send_file(&file, Some(&Message::text("see attached")))
        .await
        .expect("upload should succeed");

    let requests = env.provider.received_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_multipart_part(request, "files[0]");
    assert_multipart_part(request, "payload_json");

    let text = request.text();
    assert!(text.contains("filename=\"report.txt\""));
    assert!(text.contains("nightly report contents"));
    assert!(text.contains(r#"{"content":"see attached"}"#));
}

#[tokio::test]
async fn file_upload_without_message_has_no_payload_part() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("image.png");
    std::fs::write(&file, [0x89, b'P', b'N', b'G']).unwrap();

    let webhook = env.webhook().expect("client should build");
    webhook.send_file(&file, None).await.expect("upload should succeed");

    let request = &env.provider.received_requests()[0];
    assert_multipart_part(request, "files[0]");
    assert!(!request.text().contains("name=\"payload_json\""));
}

#[tokio::test]
async fn missing_file_is_file_system_error_without_requests() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;

    let dir = tempfile::tempdir().unwrap();
    let webhook = env.webhook().expect("client should build");
    let error = webhook.send_file(dir.path().join("absent.log"), None).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::FileSystem);
    assert_eq!(error.code(), "FILE_SYSTEM_ERROR");
    assert!(error.to_string().contains("absent.log"));
    env.provider.assert_request_count(0);
}

#[tokio::test]
async fn invalid_attachment_message_rejected_before_upload() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "a").unwrap();

    let webhook = env.webhook().expect("client should build");
    let error =
        webhook.send_file(&file, Some(&fixtures::oversized_message())).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Validation);
    env.provider.assert_request_count(0);
}

#[tokio::test]
async fn notices_use_their_colors() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;

    let webhook = env.webhook().expect("client should build");
    webhook.info("Info", None).await.unwrap();
    webhook.success("Success", Some("done")).await.unwrap();
    webhook.warning("Warning", None).await.unwrap();
    webhook.error("Error", Some("failed")).await.unwrap();

    let embeds: Vec<Value> = env
        .provider
        .received_requests()
        .iter()
        .map(|r| r.json()["embeds"][0].clone())
        .collect();

    assert_eq!(embeds.len(), 4);
    assert_eq!(embeds[0]["color"], colors::INFO);
    assert_eq!(embeds[1]["color"], colors::SUCCESS);
    assert_eq!(embeds[1]["description"], "done");
    assert_eq!(embeds[2]["color"], colors::WARNING);
    assert!(embeds[2].get("description").is_none());
    assert_eq!(embeds[3]["color"], colors::ERROR);
    assert_eq!(embeds[3]["title"], "Error");
}

#[tokio::test]
async fn wait_flag_sent_on_create_only() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;
    env.provider.on(Method::DELETE, env.provider.message_path("3"), MockReply::NoContent).await;

    let webhook = env
        .webhook_with(WebhookConfig { wait: true, ..env.config() })
        .expect("client should build");
    webhook.send(&Message::text("hi")).await.unwrap();
    webhook.delete("3").await.unwrap();

    let requests = env.provider.received_requests();
    assert_eq!(requests[0].query.as_deref(), Some("wait=true"));
    assert_eq!(requests[1].query, None);
}

#[tokio::test]
async fn user_agent_and_content_type_sent() {
    let env = TestEnv::new().await;
    env.provider.accept_messages().await;

    let webhook = env.webhook().expect("client should build");
    webhook.send(&Message::text("hi")).await.unwrap();

    let request = &env.provider.received_requests()[0];
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert!(request.header("user-agent").is_some_and(|ua| ua.starts_with("hookpost/")));
}
