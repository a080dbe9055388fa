//! Integration tests for the WebSocket event stream.
//!
//! These tests validate connection handling, the order of judge events around
//! a submission, and fan-out to concurrent clients.

use std::net::TcpListener;
use std::time::Duration;

use futures::SinkExt;
use futures::StreamExt;
use judge_engine::{DiagnosticKind, JudgeEvent, SubmissionStatus};
use judge_server::{create_router, AppState, Config};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

const HELLO: &str = r#"public class HelloWorld {
    public static void main(String[] args) {
        System.out.println("Hello, World!");
    }
}"#;

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Helper type for WebSocket client
type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawns the test server and returns its address.
async fn spawn_test_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, handle)
}

fn test_state() -> AppState {
    AppState::new(Config {
        execution_delay_ms: 0,
        ..Config::default()
    })
}

/// Connects a WebSocket client and consumes its `connected` event.
async fn connect_client(addr: &str) -> WsClient {
    let (mut ws_stream, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect to WebSocket");

    let event = receive_event(&mut ws_stream).await;
    assert!(
        matches!(event, JudgeEvent::Connected(_)),
        "Expected Connected event, got: {event:?}"
    );

    ws_stream
}

/// Receives the next text message from the WebSocket and parses it as a JudgeEvent.
/// Automatically handles ping frames by responding with pong.
async fn receive_event(client: &mut WsClient) -> JudgeEvent {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse event");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {}
            other => panic!("Expected text message, got: {other:?}"),
        }
    }
}

async fn post(addr: &str, path: &str, body: &serde_json::Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{addr}{path}"))
        .json(body)
        .send()
        .await
        .expect("Request failed");
    assert!(response.status().is_success());
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_client_receives_connected_event_on_connect() {
    let (addr, _handle) = spawn_test_server(test_state()).await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect to WebSocket");

    let raw = timeout(Duration::from_secs(5), client.next())
        .await
        .expect("Timeout waiting for message")
        .expect("Stream ended")
        .expect("WebSocket error");

    let Message::Text(text) = raw else {
        panic!("Expected text message");
    };
    let value: serde_json::Value = serde_json::from_str(&text).expect("Invalid JSON");
    assert_eq!(value["event"], "connected");
    assert!(value["payload"]["serverTime"].is_string());
}

#[tokio::test]
async fn test_status_counts_subscribers() {
    let (addr, _handle) = spawn_test_server(test_state()).await;
    let _client = connect_client(&addr).await;

    let status: serde_json::Value = reqwest::get(format!("http://{addr}/api/status"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert_eq!(status["subscribers"], 1);
}

// ============================================================================
// Event Tests
// ============================================================================

#[tokio::test]
async fn test_execute_publishes_session_events_in_order() {
    let (addr, _handle) = spawn_test_server(test_state()).await;
    let mut client = connect_client(&addr).await;

    post(&addr, "/api/execute", &json!({ "sourceText": HELLO })).await;

    let JudgeEvent::SessionStarted(started) = receive_event(&mut client).await else {
        panic!("Expected SessionStarted event");
    };
    let JudgeEvent::VerdictReady(ready) = receive_event(&mut client).await else {
        panic!("Expected VerdictReady event");
    };

    assert_eq!(started.session_id, ready.session_id);
    assert!(ready.succeeded);
    assert!(ready.diagnostic.is_none());
}

#[tokio::test]
async fn test_failed_verdict_event_carries_diagnostic() {
    let (addr, _handle) = spawn_test_server(test_state()).await;
    let mut client = connect_client(&addr).await;

    post(
        &addr,
        "/api/execute",
        &json!({ "sourceText": "public static void main() { System.out.println(\"Hi\") }" }),
    )
    .await;

    assert!(matches!(
        receive_event(&mut client).await,
        JudgeEvent::SessionStarted(_)
    ));
    let JudgeEvent::VerdictReady(ready) = receive_event(&mut client).await else {
        panic!("Expected VerdictReady event");
    };

    assert!(!ready.succeeded);
    assert_eq!(
        ready.diagnostic,
        Some(DiagnosticKind::MissingStatementTerminator)
    );
}

#[tokio::test]
async fn test_submit_publishes_graded_event() {
    let (addr, _handle) = spawn_test_server(test_state()).await;
    let mut client = connect_client(&addr).await;

    post(&addr, "/api/problems/1/submit", &json!({ "sourceText": HELLO })).await;

    assert!(matches!(
        receive_event(&mut client).await,
        JudgeEvent::SessionStarted(_)
    ));
    assert!(matches!(
        receive_event(&mut client).await,
        JudgeEvent::VerdictReady(_)
    ));
    let JudgeEvent::SubmissionGraded(graded) = receive_event(&mut client).await else {
        panic!("Expected SubmissionGraded event");
    };

    assert_eq!(graded.problem_id, 1);
    assert_eq!(graded.status, SubmissionStatus::Accepted);
    assert_eq!(graded.passed, 1);
    assert_eq!(graded.total, 1);
}

// ============================================================================
// Multiple Client Tests
// ============================================================================

#[tokio::test]
async fn test_events_reach_every_client() {
    let (addr, _handle) = spawn_test_server(test_state()).await;
    let mut first = connect_client(&addr).await;
    let mut second = connect_client(&addr).await;

    post(&addr, "/api/execute", &json!({ "sourceText": HELLO })).await;

    for client in [&mut first, &mut second] {
        assert!(matches!(
            receive_event(client).await,
            JudgeEvent::SessionStarted(_)
        ));
        assert!(matches!(
            receive_event(client).await,
            JudgeEvent::VerdictReady(_)
        ));
    }
}

#[tokio::test]
async fn test_session_ids_increase_across_requests() {
    let (addr, _handle) = spawn_test_server(test_state()).await;
    let mut client = connect_client(&addr).await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        post(&addr, "/api/execute", &json!({ "sourceText": HELLO })).await;
        if let JudgeEvent::SessionStarted(started) = receive_event(&mut client).await {
            ids.push(started.session_id);
        }
        receive_event(&mut client).await;
    }

    assert_eq!(ids.len(), 2);
    assert!(ids[0] < ids[1]);
}

#[tokio::test]
async fn test_client_close_is_handled() {
    let (addr, _handle) = spawn_test_server(test_state()).await;
    let mut client = connect_client(&addr).await;

    client.close(None).await.expect("Failed to close");

    // The server keeps serving other clients.
    let mut other = connect_client(&addr).await;
    post(&addr, "/api/execute", &json!({ "sourceText": HELLO })).await;
    assert!(matches!(
        receive_event(&mut other).await,
        JudgeEvent::SessionStarted(_)
    ));
}
