//! Data model for one judging invocation.
//!
//! A [`SubmissionRequest`] goes in, exactly one [`Verdict`] comes out, and the
//! evaluator turns that verdict plus a problem's [`TestFixture`]s into a
//! [`JudgingResult`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JudgeError, Result};

// ============================================================================
// SubmissionRequest
// ============================================================================

/// Immutable input to one judging invocation.
///
/// Deserialization goes through [`SubmissionRequest::new`], so empty source
/// text is rejected there too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSubmissionRequest")]
pub struct SubmissionRequest {
    source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stdin_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubmissionRequest {
    source_text: String,
    #[serde(default)]
    stdin_text: Option<String>,
}

impl TryFrom<RawSubmissionRequest> for SubmissionRequest {
    type Error = JudgeError;

    fn try_from(raw: RawSubmissionRequest) -> Result<Self> {
        Self::new(raw.source_text, raw.stdin_text)
    }
}

impl SubmissionRequest {
    /// Creates a request, rejecting empty source text.
    ///
    /// # Examples
    ///
    /// ```
    /// use judge_engine::{JudgeError, SubmissionRequest};
    ///
    /// assert!(SubmissionRequest::new("class A {}", None).is_ok());
    /// assert_eq!(SubmissionRequest::new("", None), Err(JudgeError::EmptySource));
    /// ```
    pub fn new(source_text: impl Into<String>, stdin_text: Option<String>) -> Result<Self> {
        let source_text = source_text.into();
        if source_text.is_empty() {
            return Err(JudgeError::EmptySource);
        }
        Ok(Self {
            source_text,
            stdin_text,
        })
    }

    /// The submitted source text.
    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// The optional stdin supplied with the submission.
    #[must_use]
    pub fn stdin_text(&self) -> Option<&str> {
        self.stdin_text.as_deref()
    }
}

// ============================================================================
// Diagnostic
// ============================================================================

/// Why a submission was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No program entry point was found.
    MissingEntryPoint,
    /// An opening brace appears without any closing brace.
    UnbalancedBraceOpen,
    /// A closing brace appears without any opening brace.
    UnbalancedBraceClose,
    /// Output statements are present but nothing is terminated.
    MissingStatementTerminator,
    /// The session exceeded its wall-clock budget.
    TimedOut,
}

impl DiagnosticKind {
    /// Returns the fixed message for the structural kinds.
    ///
    /// `TimedOut` carries its budget in the message, see [`Diagnostic::timed_out`].
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::MissingEntryPoint => "Compilation error: Missing main method.",
            Self::UnbalancedBraceOpen => "Compilation error: Missing closing brace '}'.",
            Self::UnbalancedBraceClose => "Compilation error: Missing opening brace '{'.",
            Self::MissingStatementTerminator => "Compilation error: Missing semicolon ';'.",
            Self::TimedOut => "Execution timed out.",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntryPoint => write!(f, "missing_entry_point"),
            Self::UnbalancedBraceOpen => write!(f, "unbalanced_brace_open"),
            Self::UnbalancedBraceClose => write!(f, "unbalanced_brace_close"),
            Self::MissingStatementTerminator => write!(f, "missing_statement_terminator"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// A structured, human-readable reason a submission failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The category of failure.
    pub kind: DiagnosticKind,
    /// Message surfaced verbatim to the learner.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic carrying the kind's standard message.
    #[must_use]
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
        }
    }

    /// Creates a `TimedOut` diagnostic naming the exceeded budget.
    #[must_use]
    pub fn timed_out(budget: Duration) -> Self {
        Self {
            kind: DiagnosticKind::TimedOut,
            message: format!("Execution timed out after {}ms.", budget.as_millis()),
        }
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// The outcome of one judging session.
///
/// A failed verdict always carries a diagnostic and an empty output; a
/// successful one never carries a diagnostic. Verdicts are built through
/// [`Verdict::success`] and [`Verdict::failure`]; deserialization rejects any
/// other shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawVerdict")]
pub struct Verdict {
    succeeded: bool,
    simulated_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    diagnostic: Option<Diagnostic>,
    #[serde(rename = "elapsedMs", with = "elapsed_ms")]
    elapsed: Duration,
}

impl Verdict {
    /// A successful verdict with the simulated stdout.
    #[must_use]
    pub fn success(simulated_output: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            succeeded: true,
            simulated_output: simulated_output.into(),
            diagnostic: None,
            elapsed,
        }
    }

    /// A failed verdict carrying its diagnostic.
    #[must_use]
    pub const fn failure(diagnostic: Diagnostic, elapsed: Duration) -> Self {
        Self {
            succeeded: false,
            simulated_output: String::new(),
            diagnostic: Some(diagnostic),
            elapsed,
        }
    }

    /// Whether the submission was accepted for execution.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// The simulated stdout; empty on failure.
    #[must_use]
    pub fn simulated_output(&self) -> &str {
        &self.simulated_output
    }

    /// The rejection reason, present iff the verdict failed.
    #[must_use]
    pub const fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostic.as_ref()
    }

    /// Time from session entry to its terminal state.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed time rendered for display, e.g. `1.00s`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use judge_engine::Verdict;
    ///
    /// let verdict = Verdict::success("Hi", Duration::from_millis(1234));
    /// assert_eq!(verdict.elapsed_label(), "1.23s");
    /// ```
    #[must_use]
    pub fn elapsed_label(&self) -> String {
        format!("{:.2}s", self.elapsed.as_secs_f64())
    }

    /// Returns `true` if this verdict and `other` agree on everything but timing.
    #[must_use]
    pub fn same_outcome(&self, other: &Self) -> bool {
        self.succeeded == other.succeeded
            && self.simulated_output == other.simulated_output
            && self.diagnostic == other.diagnostic
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    succeeded: bool,
    #[serde(default)]
    simulated_output: String,
    #[serde(default)]
    diagnostic: Option<Diagnostic>,
    #[serde(rename = "elapsedMs", with = "elapsed_ms")]
    elapsed: Duration,
}

impl TryFrom<RawVerdict> for Verdict {
    type Error = &'static str;

    fn try_from(raw: RawVerdict) -> std::result::Result<Self, Self::Error> {
        match (raw.succeeded, raw.diagnostic) {
            (true, None) => Ok(Self::success(raw.simulated_output, raw.elapsed)),
            (false, Some(diagnostic)) if raw.simulated_output.is_empty() => {
                Ok(Self::failure(diagnostic, raw.elapsed))
            }
            (true, Some(_)) => Err("a successful verdict cannot carry a diagnostic"),
            (false, None) => Err("a failed verdict must carry a diagnostic"),
            (false, Some(_)) => Err("a failed verdict cannot carry output"),
        }
    }
}

mod elapsed_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Fixtures and results
// ============================================================================

/// An input/expected-output pair attached to a problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFixture {
    /// Stdin fed to the program.
    #[serde(default)]
    pub input: String,
    /// Text the program's output must contain.
    pub expected_output: String,
}

impl TestFixture {
    /// Creates a fixture.
    #[must_use]
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Outcome of one fixture against a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureResult {
    /// The fixture that was checked.
    pub fixture: TestFixture,
    /// Whether the verdict satisfied it.
    pub passed: bool,
}

/// Aggregate status of a graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// The submission satisfied the problem.
    Accepted,
    /// The program ran but its output satisfied no fixture.
    WrongAnswer,
    /// The verdict failed; fixtures were not satisfiable.
    Failed,
}

impl SubmissionStatus {
    /// Returns `true` for [`SubmissionStatus::Accepted`].
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// A short human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "Wrong answer",
            Self::Failed => "Failed to execute",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::WrongAnswer => write!(f, "wrong_answer"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A verdict together with its per-fixture results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgingResult {
    /// The verdict that was graded.
    pub verdict: Verdict,
    /// One entry per fixture, in fixture order.
    pub fixture_results: Vec<FixtureResult>,
    /// Aggregate submission status.
    pub status: SubmissionStatus,
}

impl JudgingResult {
    /// Returns `true` if the submission was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.status.is_accepted()
    }

    /// Number of fixtures that passed.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.fixture_results.iter().filter(|r| r.passed).count()
    }
}
