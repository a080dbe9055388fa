//! Integration tests for the HTTP API over a real listener.
//!
//! Each test binds its own server on an ephemeral port and talks to it with
//! reqwest, so routing, JSON bodies, status codes and CORS are exercised the
//! way a browser client would see them.

use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use judge_engine::SubmissionStatus;
use judge_server::{
    create_router, AppState, Config, ExecuteResponse, Problem, ProblemSummary, StatusResponse,
    SubmitResponse, UserSubmissionsResponse,
};
use reqwest::StatusCode;
use serde_json::json;

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

/// Config with no artificial delay.
fn test_config() -> Config {
    Config {
        execution_delay_ms: 0,
        ..Config::default()
    }
}

/// Spawns the test server and returns its base URL.
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

    (format!("http://{addr}"), handle)
}

/// Writes a problem set to a unique temp file.
fn write_problem_file(name: &str, contents: &serde_json::Value) -> PathBuf {
    let path = std::env::temp_dir().join(format!("judge_it_{name}_{}.json", std::process::id()));
    std::fs::write(&path, contents.to_string()).expect("Failed to write problem file");
    path
}

// ============================================================================
// Execute
// ============================================================================

#[tokio::test]
async fn test_execute_hello_world() {
    let (base, _handle) = spawn_test_server(AppState::new(test_config())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/execute"))
        .json(&json!({ "sourceText": HELLO }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::OK);
    let body: ExecuteResponse = response.json().await.expect("Invalid body");
    assert!(body.succeeded);
    assert_eq!(body.simulated_output, "Hello, World!");
    assert_eq!(body.elapsed_label, "0.00s");
    assert!(body.diagnostic_message.is_none());
}

#[tokio::test]
async fn test_execute_accepts_legacy_field_names() {
    let (base, _handle) = spawn_test_server(AppState::new(test_config())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/execute"))
        .json(&json!({ "code": "public class A { }", "input": "5" }))
        .send()
        .await
        .expect("Request failed");

    let body: ExecuteResponse = response.json().await.expect("Invalid body");
    assert!(!body.succeeded);
    assert_eq!(
        body.diagnostic_message.as_deref(),
        Some("Compilation error: Missing main method.")
    );
    assert!(body.simulated_output.is_empty());
}

#[tokio::test]
async fn test_execute_without_code_is_bad_request() {
    let (base, _handle) = spawn_test_server(AppState::new(test_config())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/execute"))
        .json(&json!({ "stdinText": "5" }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["error"], "No code provided");
}

#[tokio::test]
async fn test_execute_honours_configured_delay() {
    let config = Config {
        execution_delay_ms: 200,
        ..Config::default()
    };
    let (base, _handle) = spawn_test_server(AppState::new(config)).await;

    let started = std::time::Instant::now();
    let body: ExecuteResponse = reqwest::Client::new()
        .post(format!("{base}/api/execute"))
        .json(&json!({ "sourceText": HELLO }))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(body.elapsed_label.starts_with("0.2"));
}

#[tokio::test]
async fn test_cors_headers_present() {
    let (base, _handle) = spawn_test_server(AppState::new(test_config())).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/api/status"))
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

// ============================================================================
// Problems
// ============================================================================

#[tokio::test]
async fn test_builtin_problems_listed() {
    let (base, _handle) = spawn_test_server(AppState::new(test_config())).await;

    let problems: Vec<ProblemSummary> = reqwest::get(format!("{base}/api/problems"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert_eq!(problems.len(), 5);
    assert_eq!(problems[0].title, "Hello World");
    assert_eq!(problems[0].fixture_count, 1);
}

#[tokio::test]
async fn test_problems_served_from_file_without_solution() {
    let path = write_problem_file(
        "file_store",
        &json!([
            { "id": 7, "title": "Sum", "difficulty": "EASY",
              "testCases": "Input: 2 3\nOutput: 5", "solution": "secret" },
            { "id": 3, "title": "Greeting", "concept": "Output",
              "fixtures": [{ "expectedOutput": "Hi" }] }
        ]),
    );
    let config = Config {
        problems_file: Some(path.display().to_string()),
        ..test_config()
    };
    let (base, _handle) = spawn_test_server(AppState::new(config)).await;

    let problems: Vec<ProblemSummary> = reqwest::get(format!("{base}/api/problems"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    let ids: Vec<u64> = problems.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 7]);

    let raw: serde_json::Value = reqwest::get(format!("{base}/api/problems/7"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert!(raw.get("solution").is_none());

    let problem: Problem = serde_json::from_value(raw).expect("Invalid problem");
    assert_eq!(problem.fixtures.len(), 1);
    assert_eq!(problem.fixtures[0].input, "2 3");
    assert_eq!(problem.fixtures[0].expected_output, "5");

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_corrupted_problem_file_falls_back_to_builtin() {
    let path = std::env::temp_dir().join(format!("judge_it_corrupt_{}.json", std::process::id()));
    std::fs::write(&path, "{ not json").expect("Failed to write problem file");

    let config = Config {
        problems_file: Some(path.display().to_string()),
        ..test_config()
    };
    let (base, _handle) = spawn_test_server(AppState::new(config)).await;

    let problems: Vec<ProblemSummary> = reqwest::get(format!("{base}/api/problems"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(problems.len(), 5);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_problem_filters() {
    let (base, _handle) = spawn_test_server(AppState::new(test_config())).await;

    let problems: Vec<ProblemSummary> =
        reqwest::get(format!("{base}/api/problems?search=hello"))
            .await
            .expect("Request failed")
            .json()
            .await
            .expect("Invalid body");

    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].id, 1);
}

#[tokio::test]
async fn test_unknown_problem_is_not_found() {
    let (base, _handle) = spawn_test_server(AppState::new(test_config())).await;

    let response = reqwest::get(format!("{base}/api/problems/999"))
        .await
        .expect("Request failed");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Submissions
// ============================================================================

#[tokio::test]
async fn test_submit_records_and_reports_statistics() {
    let (base, _handle) = spawn_test_server(AppState::new(test_config())).await;
    let client = reqwest::Client::new();

    let accepted: SubmitResponse = client
        .post(format!("{base}/api/problems/1/submit"))
        .json(&json!({ "sourceText": HELLO, "userId": "learner-1" }))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert!(accepted.accepted);
    assert_eq!(accepted.status, SubmissionStatus::Accepted);
    assert!(accepted.fixture_results[0].passed);

    let wrong_source = HELLO.replace("Hello, World!", "Goodbye");
    let wrong: SubmitResponse = client
        .post(format!("{base}/api/problems/1/submit"))
        .json(&json!({ "sourceText": wrong_source, "userId": "learner-1" }))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert!(!wrong.accepted);
    assert_eq!(wrong.status, SubmissionStatus::WrongAnswer);

    let history: UserSubmissionsResponse = client
        .get(format!("{base}/api/users/learner-1/submissions"))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert_eq!(history.stats.total, 2);
    assert_eq!(history.stats.accepted, 1);
    assert_eq!(history.stats.problems_attempted, 1);
    assert_eq!(history.stats.success_rate, 50);
    assert_eq!(history.recent[0].status, SubmissionStatus::WrongAnswer);
}

#[tokio::test]
async fn test_status_reports_pool_capacity() {
    let config = Config {
        max_concurrent: 3,
        ..test_config()
    };
    let (base, _handle) = spawn_test_server(AppState::new(config)).await;

    let status: StatusResponse = reqwest::get(format!("{base}/api/status"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert_eq!(status.max_concurrent, 3);
    assert_eq!(status.available, 3);
}
