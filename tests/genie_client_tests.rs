//! Genie client and polling engine against a mock Genie server.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use genie_console::error::GenieError;
use genie_console::genie::{ConversationApi, ConversationClient, PollPolicy, PollingEngine};

const SPACE: &str = "/api/2.0/genie/spaces/space-1";
const MESSAGE: &str = "/api/2.0/genie/spaces/space-1/conversations/conv-1/messages/msg-1";

fn client(server: &MockServer) -> ConversationClient {
    ConversationClient::new(server.uri(), "space-1", "dapi-test").unwrap()
}

fn engine(server: &MockServer) -> PollingEngine {
    PollingEngine::new(
        Arc::new(client(server)),
        PollPolicy::builder()
            .interval(Duration::ZERO)
            .max_attempts(10)
            .build(),
    )
}

async fn mount_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("{SPACE}/start-conversation")))
        .and(header("authorization", "Bearer dapi-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message_id": "msg-1",
            "conversation_id": "conv-1",
            "conversation": {"id": "conv-1"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn start_conversation_returns_ids_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{SPACE}/start-conversation")))
        .and(header("authorization", "Bearer dapi-test"))
        .and(body_json(json!({"content": "Top 5 products"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message_id": "01ef-msg",
            "conversation_id": "01ef-conv"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let started = client(&server)
        .start_conversation("Top 5 products")
        .await
        .unwrap();

    assert_eq!(started.message_id, "01ef-msg");
    assert_eq!(started.conversation_id, "01ef-conv");
}

#[tokio::test]
async fn start_conversation_missing_id_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{SPACE}/start-conversation")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message_id": "m"})))
        .mount(&server)
        .await;

    let err = client(&server).start_conversation("q").await.unwrap_err();

    assert!(matches!(err, GenieError::Parse(ref m) if m.contains("conversation_id")));
}

#[tokio::test]
async fn non_success_status_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{SPACE}/start-conversation")))
        .respond_with(ResponseTemplate::new(403).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let err = client(&server).start_conversation("q").await.unwrap_err();

    match err {
        GenieError::Protocol { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "invalid token");
        }
        other => panic!("expected Protocol, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_attachments_give_empty_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "EXECUTING_QUERY",
            "attachments": []
        })))
        .mount(&server)
        .await;

    let snap = client(&server)
        .message_status("conv-1", "msg-1")
        .await
        .unwrap();

    assert_eq!(snap.status, "EXECUTING_QUERY");
    assert_eq!(
        (snap.attachment_id.as_str(), snap.query.as_str(), snap.description.as_str()),
        ("", "", "")
    );
}

#[tokio::test]
async fn attachment_without_query_keeps_query_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "COMPLETED",
            "attachments": [{"attachment_id": "att-7", "text": {"content": "hello"}}]
        })))
        .mount(&server)
        .await;

    let snap = client(&server)
        .message_status("conv-1", "msg-1")
        .await
        .unwrap();

    assert_eq!(snap.attachment_id, "att-7");
    assert_eq!(snap.query, "");
    assert_eq!(snap.description, "");
}

#[tokio::test]
async fn first_attachment_query_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "COMPLETED",
            "attachments": [
                {"attachment_id": "att-1", "query": {"query": "SELECT 1", "description": "one"}},
                {"attachment_id": "att-2", "query": {"query": "SELECT 2", "description": "two"}}
            ]
        })))
        .mount(&server)
        .await;

    let snap = client(&server)
        .message_status("conv-1", "msg-1")
        .await
        .unwrap();

    assert_eq!(snap.attachment_id, "att-1");
    assert_eq!(snap.query, "SELECT 1");
    assert_eq!(snap.description, "one");
}

#[tokio::test]
async fn run_polls_until_completed_then_fetches_result_once() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path(MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "RUNNING"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "COMPLETED",
            "attachments": [{"attachment_id": "att-1", "query": {"query": "SELECT *", "description": "all"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let body = r#"{"statement_response":{"result":{"data_array":[["42"]]}}}"#;
    Mock::given(method("GET"))
        .and(path(format!("{MESSAGE}/query-result/att-1")))
        .and(header("authorization", "Bearer dapi-test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let mut seen = Vec::new();
    let outcome = engine(&server)
        .run("How many?", &CancellationToken::new(), |_, snap| {
            seen.push(snap.status.clone())
        })
        .await
        .unwrap();

    assert_eq!(seen, vec!["RUNNING", "RUNNING", "COMPLETED"]);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.result, body);
    assert_eq!(outcome.snapshot.query, "SELECT *");
}

#[tokio::test]
async fn failed_status_stops_without_fetching_result() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path(MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "FAILED"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{MESSAGE}/query-result/att-1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = engine(&server).run_to_completion("q", &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, GenieError::MessageFailed { ref status } if status == "FAILED"));
}

#[tokio::test]
async fn attempt_budget_surfaces_poll_timeout() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path(MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUBMITTED"})))
        .expect(4)
        .mount(&server)
        .await;

    let engine = PollingEngine::new(
        Arc::new(client(&server)),
        PollPolicy::builder()
            .interval(Duration::ZERO)
            .max_attempts(4)
            .build(),
    );
    let err = engine.run_to_completion("q", &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, GenieError::PollTimeout { attempts: 4, .. }));
}

#[tokio::test]
async fn cancelled_token_stops_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{SPACE}/start-conversation")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = engine(&server)
        .run("q", &cancel, |_, _| {})
        .await
        .unwrap_err();

    assert!(matches!(err, GenieError::Canceled));
}
