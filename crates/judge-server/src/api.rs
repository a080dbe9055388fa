//! HTTP API for the judge.
//!
//! # Endpoints
//!
//! - `POST /api/execute` - Judge source text and return simulated output
//! - `GET /api/problems` - List problems, optionally filtered
//! - `GET /api/problems/:id` - Fetch one problem
//! - `POST /api/problems/:id/submit` - Judge and grade against a problem's fixtures
//! - `GET /api/users/:user_id/submissions` - A user's statistics and recent submissions
//! - `GET /api/status` - Pool and subscriber status
//! - `GET /ws` - WebSocket stream of judge events
//!
//! # Example
//!
//! ```no_run
//! use judge_server::{create_router, AppState, Config};
//!
//! # async fn example() {
//! let router = create_router(AppState::new(Config::default()));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use judge_engine::{
    evaluate_with_policy, input_prompt, DiagnosticKind, EventBroadcaster, EventPublisher, Judge,
    JudgeError, JudgeEvent, JudgePool, SubmissionRequest, SubmissionStatus, Verdict,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::problems::{Problem, ProblemQuery, ProblemStore, ProblemSummary};
use crate::submissions::{InMemorySubmissionLog, Submission, SubmissionSink, UserStats};
use crate::websocket::ws_handler;

/// Number of submissions returned in a user's recent list.
const RECENT_SUBMISSIONS: usize = 5;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /api/execute`.
///
/// `code` and `input` are accepted as aliases of `sourceText` and `stdinText`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Source text to judge.
    #[serde(default, alias = "code")]
    pub source_text: Option<String>,
    /// Optional stdin.
    #[serde(default, alias = "input")]
    pub stdin_text: Option<String>,
}

/// Response body for `POST /api/execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    /// Simulated stdout; empty when the verdict failed.
    pub simulated_output: String,
    /// Whether the verdict succeeded.
    pub succeeded: bool,
    /// Diagnostic kind of a failed verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_kind: Option<DiagnosticKind>,
    /// Diagnostic message of a failed verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_message: Option<String>,
    /// Elapsed time as seconds with two decimals, e.g. `"1.00s"`.
    pub elapsed_label: String,
    /// Label the program prints before reading input, if detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_prompt: Option<String>,
}

impl ExecuteResponse {
    fn from_verdict(verdict: &Verdict, input_prompt: Option<String>) -> Self {
        Self {
            simulated_output: verdict.simulated_output().to_string(),
            succeeded: verdict.succeeded(),
            diagnostic_kind: verdict.diagnostic().map(|d| d.kind),
            diagnostic_message: verdict.diagnostic().map(|d| d.message.clone()),
            elapsed_label: verdict.elapsed_label(),
            input_prompt,
        }
    }
}

/// Request body for `POST /api/problems/:id/submit`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Source text to judge.
    #[serde(default, alias = "code")]
    pub source_text: Option<String>,
    /// Optional stdin.
    #[serde(default, alias = "input")]
    pub stdin_text: Option<String>,
    /// Submitting user; the submission is recorded only when present.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Per-fixture outcome in a submit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureOutcome {
    /// Text the output had to contain.
    pub expected_output: String,
    /// Whether it did.
    pub passed: bool,
}

/// Response body for `POST /api/problems/:id/submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Whether the verdict succeeded.
    pub succeeded: bool,
    /// Simulated stdout; empty when the verdict failed.
    pub simulated_output: String,
    /// Diagnostic message of a failed verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_message: Option<String>,
    /// Elapsed time label.
    pub elapsed_label: String,
    /// One entry per fixture, in fixture order.
    pub fixture_results: Vec<FixtureOutcome>,
    /// Aggregate status.
    pub status: SubmissionStatus,
    /// Whether the submission was accepted.
    pub accepted: bool,
}

/// Response body for `GET /api/users/:user_id/submissions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSubmissionsResponse {
    /// Aggregate figures over every submission.
    pub stats: UserStats,
    /// Most recent submissions, newest first.
    pub recent: Vec<Submission>,
}

/// Response body for `GET /api/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Maximum concurrent sessions.
    pub max_concurrent: usize,
    /// Free session slots.
    pub available: usize,
    /// Connected event subscribers.
    pub subscribers: usize,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Bounded judge front.
    pub pool: JudgePool,
    /// Problem source.
    pub problems: Arc<dyn ProblemStore>,
    /// Graded submission records.
    pub submissions: Arc<dyn SubmissionSink>,
    /// Event fan-out shared by the judge and WebSocket clients.
    pub events: EventBroadcaster,
}

impl AppState {
    /// Creates state from configuration.
    ///
    /// Problems come from `problems_file` behind the static fallback, or from
    /// the built-in set when no file is configured. Submissions are kept in
    /// memory.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let problems = config.problem_store();
        Self::with_stores(config, problems, Arc::new(InMemorySubmissionLog::new()))
    }

    /// Creates state with explicit collaborators.
    #[must_use]
    pub fn with_stores(
        config: Config,
        problems: Arc<dyn ProblemStore>,
        submissions: Arc<dyn SubmissionSink>,
    ) -> Self {
        let events = EventBroadcaster::new(config.event_capacity);
        let judge = Judge::with_publisher(config.judge_options(), Arc::new(events.clone()));
        let pool = JudgePool::new(judge, config.max_concurrent, config.overflow);

        Self {
            config,
            pool,
            problems,
            submissions,
            events,
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The request was malformed.
    BadRequest(String),
    /// The requested resource does not exist.
    NotFound(String),
    /// The judge cannot take more work right now.
    Unavailable(String),
    /// Something went wrong on our side; details are logged, not returned.
    Internal(&'static str),
}

impl ApiError {
    fn from_judge(err: JudgeError) -> Self {
        match err {
            JudgeError::EmptySource => Self::BadRequest(err.to_string()),
            JudgeError::Busy { .. } | JudgeError::PoolClosed => {
                warn!(error = %err, "Judge unavailable");
                Self::Unavailable(err.to_string())
            }
            JudgeError::InvalidStateTransition { .. } => {
                error!(error = %err, "Judging failed");
                Self::Internal("Failed to execute code")
            }
        }
    }

    fn from_store(err: &ServerError) -> Self {
        error!(error = %err, "Problem store failed");
        Self::Internal("Failed to load problems")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string()),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints and the event stream.
///
/// The router carries permissive CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/execute", post(handle_execute))
        .route("/problems", get(handle_list_problems))
        .route("/problems/:id", get(handle_get_problem))
        .route("/problems/:id/submit", post(handle_submit))
        .route("/users/:user_id/submissions", get(handle_user_submissions))
        .route("/status", get(handle_status));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Builds a submission request, rejecting absent or empty source.
fn submission_request(
    source_text: Option<String>,
    stdin_text: Option<String>,
) -> Result<SubmissionRequest, ApiError> {
    SubmissionRequest::new(source_text.unwrap_or_default(), stdin_text).map_err(ApiError::from_judge)
}

fn load_problem(state: &AppState, id: u64) -> Result<Problem, ApiError> {
    state
        .problems
        .get(id)
        .map_err(|e| ApiError::from_store(&e))?
        .ok_or_else(|| ApiError::NotFound(ServerError::ProblemNotFound { id }.to_string()))
}

/// Handler for `POST /api/execute`.
async fn handle_execute(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let Json(body) = body?;
    let request = submission_request(body.source_text, body.stdin_text)?;

    info!(source_len = request.source_text().len(), "Execute request");

    let verdict = state
        .pool
        .submit(&request)
        .await
        .map_err(ApiError::from_judge)?;

    let prompt = input_prompt(request.source_text());
    Ok(Json(ExecuteResponse::from_verdict(&verdict, prompt)))
}

/// Handler for `GET /api/problems`.
async fn handle_list_problems(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProblemQuery>,
) -> Result<Json<Vec<ProblemSummary>>, ApiError> {
    let problems = state.problems.list().map_err(|e| ApiError::from_store(&e))?;

    Ok(Json(
        problems
            .iter()
            .filter(|p| query.matches(p))
            .map(Problem::summary)
            .collect(),
    ))
}

/// Handler for `GET /api/problems/:id`.
async fn handle_get_problem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Problem>, ApiError> {
    load_problem(&state, id).map(Json)
}

/// Handler for `POST /api/problems/:id/submit`.
///
/// Judges the source once, grades the verdict against every fixture, and
/// records the result when a user id is supplied. A failed recording is
/// logged and does not fail the request.
async fn handle_submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(body) = body?;
    let problem = load_problem(&state, id)?;
    let request = submission_request(body.source_text, body.stdin_text)?;

    info!(problem_id = id, user = ?body.user_id, "Submit request");

    let verdict = state
        .pool
        .submit(&request)
        .await
        .map_err(ApiError::from_judge)?;

    let result = evaluate_with_policy(
        &verdict,
        &problem.fixtures,
        state.config.empty_fixture_policy,
    );

    info!(
        problem_id = id,
        status = %result.status,
        passed = result.passed_count(),
        total = result.fixture_results.len(),
        "Submission graded"
    );
    state
        .events
        .publish(JudgeEvent::submission_graded(id, &result));

    if let Some(user_id) = body.user_id {
        let submission = Submission::new(user_id, id, request.source_text(), result.status);
        if let Err(e) = state.submissions.record(submission) {
            warn!(error = %e, problem_id = id, "Failed to record submission");
        }
    }

    Ok(Json(SubmitResponse {
        succeeded: verdict.succeeded(),
        simulated_output: verdict.simulated_output().to_string(),
        diagnostic_message: verdict.diagnostic().map(|d| d.message.clone()),
        elapsed_label: verdict.elapsed_label(),
        fixture_results: result
            .fixture_results
            .iter()
            .map(|r| FixtureOutcome {
                expected_output: r.fixture.expected_output.clone(),
                passed: r.passed,
            })
            .collect(),
        status: result.status,
        accepted: result.is_accepted(),
    }))
}

/// Handler for `GET /api/users/:user_id/submissions`.
async fn handle_user_submissions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserSubmissionsResponse>, ApiError> {
    let history = state.submissions.history(&user_id).map_err(|e| {
        error!(error = %e, user_id = %user_id, "Failed to read submissions");
        ApiError::Internal("Failed to load submissions")
    })?;

    let stats = UserStats::from_submissions(&history);
    let recent = history.into_iter().rev().take(RECENT_SUBMISSIONS).collect();

    Ok(Json(UserSubmissionsResponse { stats, recent }))
}

/// Handler for `GET /api/status`.
async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        max_concurrent: state.pool.limit(),
        available: state.pool.available(),
        subscribers: state.events.receiver_count(),
    })
}

// ============================================================================
// Tests
// ============================================================================
