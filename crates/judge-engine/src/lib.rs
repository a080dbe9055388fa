//! Heuristic Judging Engine
//!
//! Pattern-based judging of Java-like source text: structural validation,
//! output classification, simulated stdout and fixture evaluation. Nothing
//! is compiled or executed.

pub mod classifier;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod pool;
pub mod session;
pub mod synthesizer;
pub mod validator;
pub mod verdict;

pub use classifier::{classify, input_prompt, Classification, OutputKind};
pub use error::{JudgeError, Result};
pub use evaluator::{evaluate, evaluate_with_policy, EmptyFixturePolicy};
pub use events::{EventBroadcaster, EventPublisher, JudgeEvent, NoopPublisher};
pub use pool::{JudgePool, OverflowPolicy, DEFAULT_MAX_CONCURRENT};
pub use session::{
    Judge, JudgeOptions, JudgingSession, SessionStatus, DEFAULT_EXECUTION_DELAY,
};
pub use verdict::{
    Diagnostic, DiagnosticKind, FixtureResult, JudgingResult, SubmissionRequest,
    SubmissionStatus, TestFixture, Verdict,
};
