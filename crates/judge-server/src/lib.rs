//! Judge Server
//!
//! HTTP API, WebSocket event stream, configuration, problem store and
//! submission log around the judging engine.

pub mod api;
pub mod config;
pub mod error;
pub mod problems;
pub mod submissions;
pub mod websocket;

pub use api::{
    create_router, AppState, ErrorResponse, ExecuteRequest, ExecuteResponse, FixtureOutcome,
    StatusResponse, SubmitRequest, SubmitResponse, UserSubmissionsResponse,
};
pub use config::Config;
pub use error::{Result, ServerError};
pub use problems::{
    parse_legacy_fixtures, Difficulty, FallbackProblemStore, FileProblemStore, Problem,
    ProblemQuery, ProblemStore, ProblemSummary, StaticProblemStore,
};
pub use submissions::{InMemorySubmissionLog, Submission, SubmissionSink, UserStats};
pub use websocket::{ws_handler, HEARTBEAT_INTERVAL};
