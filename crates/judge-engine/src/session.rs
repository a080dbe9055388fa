//! Judging sessions.
//!
//! A [`JudgingSession`] is the state machine for one invocation; [`Judge`]
//! drives sessions to completion and publishes their events.
//!
//! ```text
//! Idle -> Validating -> Failed
//!                    -> Classifying -> Synthesizing -> Succeeded
//! ```
//!
//! Any non-terminal state may also move to `Failed` when a timeout is set
//! and exceeded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::{self, Classification};
use crate::error::{JudgeError, Result};
use crate::events::{EventPublisher, JudgeEvent, NoopPublisher};
use crate::synthesizer;
use crate::validator;
use crate::verdict::{Diagnostic, DiagnosticKind, SubmissionRequest, Verdict};

/// Artificial delay applied before validation unless configured otherwise.
pub const DEFAULT_EXECUTION_DELAY: Duration = Duration::from_millis(1000);

// ============================================================================
// SessionStatus
// ============================================================================

/// Current status of a judging session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, not yet started.
    #[default]
    Idle,
    /// Structural rules are being checked.
    Validating,
    /// Output signals are being extracted.
    Classifying,
    /// Simulated output is being built.
    Synthesizing,
    /// Terminal: a successful verdict was produced.
    Succeeded,
    /// Terminal: a failed verdict was produced.
    Failed,
}

impl SessionStatus {
    /// Returns `true` if this status represents a terminal state.
    ///
    /// # Examples
    ///
    /// ```
    /// use judge_engine::SessionStatus;
    ///
    /// assert!(SessionStatus::Succeeded.is_terminal());
    /// assert!(SessionStatus::Failed.is_terminal());
    /// assert!(!SessionStatus::Validating.is_terminal());
    /// ```
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns `true` if the machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Validating)
                | (Self::Validating, Self::Classifying)
                | (Self::Classifying, Self::Synthesizing)
                | (Self::Synthesizing, Self::Succeeded)
                | (
                    Self::Validating | Self::Classifying | Self::Synthesizing,
                    Self::Failed
                )
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::Classifying => write!(f, "classifying"),
            Self::Synthesizing => write!(f, "synthesizing"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ============================================================================
// JudgingSession
// ============================================================================

/// State machine for one judging invocation.
///
/// Each step checks that the session is in the state it expects and moves it
/// forward. Sessions run once; there is no way back out of a terminal state.
#[derive(Debug, Clone)]
pub struct JudgingSession {
    id: u64,
    status: SessionStatus,
    history: Vec<SessionStatus>,
    started_at: Option<Instant>,
}

impl JudgingSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            status: SessionStatus::Idle,
            history: vec![SessionStatus::Idle],
            started_at: None,
        }
    }

    /// The session identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The current status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Every status the session has been in, oldest first.
    #[must_use]
    pub fn history(&self) -> &[SessionStatus] {
        &self.history
    }

    /// Time since [`start`](Self::start), or zero if not started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    fn transition(&mut self, next: SessionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(JudgeError::invalid_transition(self.status, next));
        }
        debug!(session_id = self.id, from = %self.status, to = %next, "Session transition");
        self.status = next;
        self.history.push(next);
        Ok(())
    }

    fn require(&self, expected: SessionStatus, next: SessionStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(JudgeError::invalid_transition(self.status, next))
        }
    }

    /// `Idle -> Validating`. Starts the elapsed clock.
    pub fn start(&mut self) -> Result<()> {
        self.transition(SessionStatus::Validating)?;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// Runs the validator.
    ///
    /// On a diagnostic the session fails and the failed verdict is returned;
    /// otherwise the session moves to `Classifying` and `None` is returned.
    pub fn validate(&mut self, source: &str) -> Result<Option<Verdict>> {
        self.require(SessionStatus::Validating, SessionStatus::Classifying)?;
        match validator::validate(source) {
            Some(diagnostic) => self.fail(diagnostic).map(Some),
            None => {
                self.transition(SessionStatus::Classifying)?;
                Ok(None)
            }
        }
    }

    /// Runs the classifier and moves to `Synthesizing`.
    pub fn classify(&mut self, source: &str) -> Result<Classification> {
        self.require(SessionStatus::Classifying, SessionStatus::Synthesizing)?;
        let classification = classifier::classify(source);
        self.transition(SessionStatus::Synthesizing)?;
        Ok(classification)
    }

    /// Runs the synthesizer and finishes the session.
    pub fn synthesize(&mut self, classification: &Classification) -> Result<Verdict> {
        self.require(SessionStatus::Synthesizing, SessionStatus::Succeeded)?;
        match synthesizer::synthesize(classification) {
            Some(output) => {
                self.transition(SessionStatus::Succeeded)?;
                Ok(Verdict::success(output, self.elapsed()))
            }
            None => self.fail(Diagnostic::new(DiagnosticKind::MissingEntryPoint)),
        }
    }

    /// Fails the session because it ran past `budget`.
    pub fn time_out(&mut self, budget: Duration) -> Result<Verdict> {
        self.fail(Diagnostic::timed_out(budget))
    }

    fn fail(&mut self, diagnostic: Diagnostic) -> Result<Verdict> {
        self.transition(SessionStatus::Failed)?;
        Ok(Verdict::failure(diagnostic, self.elapsed()))
    }
}

// ============================================================================
// Judge
// ============================================================================

/// Tunables for a [`Judge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgeOptions {
    /// Delay awaited on entry to validation.
    pub execution_delay: Duration,
    /// Wall-clock budget per session; `None` disables enforcement.
    pub timeout: Option<Duration>,
}

impl JudgeOptions {
    /// Options with no delay and no timeout.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            execution_delay: Duration::ZERO,
            timeout: None,
        }
    }

    /// Sets the execution delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.execution_delay = delay;
        self
    }

    /// Sets the wall-clock budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for JudgeOptions {
    fn default() -> Self {
        Self {
            execution_delay: DEFAULT_EXECUTION_DELAY,
            timeout: None,
        }
    }
}

/// Runs judging sessions.
///
/// A `Judge` holds only immutable options, a publisher handle and a session
/// counter; concurrent calls to [`judge`](Self::judge) do not interact.
///
/// # Examples
///
/// ```
/// use judge_engine::{Judge, JudgeOptions, SubmissionRequest};
///
/// # tokio_test::block_on(async {
/// let judge = Judge::new(JudgeOptions::immediate());
/// let request = SubmissionRequest::new(
///     r#"public class X { void main(){ System.out.println("Hi"); } }"#,
///     None,
/// ).unwrap();
///
/// let verdict = judge.judge(&request).await.unwrap();
/// assert!(verdict.succeeded());
/// assert_eq!(verdict.simulated_output(), "Hi");
/// # });
/// ```
#[derive(Debug)]
pub struct Judge {
    options: JudgeOptions,
    publisher: Arc<dyn EventPublisher>,
    next_session_id: AtomicU64,
}

impl Default for Judge {
    fn default() -> Self {
        Self::new(JudgeOptions::default())
    }
}

impl Judge {
    /// Creates a judge that discards events.
    #[must_use]
    pub fn new(options: JudgeOptions) -> Self {
        Self::with_publisher(options, Arc::new(NoopPublisher))
    }

    /// Creates a judge that reports to `publisher`.
    #[must_use]
    pub fn with_publisher(options: JudgeOptions, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            options,
            publisher,
            next_session_id: AtomicU64::new(1),
        }
    }

    /// The judge's options.
    #[must_use]
    pub const fn options(&self) -> &JudgeOptions {
        &self.options
    }

    /// Runs one session to a terminal state and returns its verdict.
    ///
    /// Structural problems come back as a failed verdict, not an error. An
    /// error here means the session machinery itself misbehaved.
    pub async fn judge(&self, request: &SubmissionRequest) -> Result<Verdict> {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let mut session = JudgingSession::new(session_id);

        debug!(
            session_id,
            source_len = request.source_text().len(),
            stdin_len = request.stdin_text().map_or(0, str::len),
            "Judging submission"
        );
        self.publisher.publish(JudgeEvent::session_started(session_id));

        let verdict = match self.options.timeout {
            Some(budget) => {
                let outcome = tokio::time::timeout(budget, self.drive(&mut session, request)).await;
                match outcome {
                    Ok(verdict) => verdict?,
                    Err(_) => session.time_out(budget)?,
                }
            }
            None => self.drive(&mut session, request).await?,
        };

        info!(
            session_id,
            succeeded = verdict.succeeded(),
            diagnostic = ?verdict.diagnostic().map(|d| d.kind),
            elapsed_ms = verdict.elapsed().as_millis(),
            "Verdict ready"
        );
        self.publisher
            .publish(JudgeEvent::verdict_ready(session_id, &verdict));

        Ok(verdict)
    }

    async fn drive(&self, session: &mut JudgingSession, request: &SubmissionRequest) -> Result<Verdict> {
        session.start()?;

        if !self.options.execution_delay.is_zero() {
            tokio::time::sleep(self.options.execution_delay).await;
        }

        let source = request.source_text();
        if let Some(failed) = session.validate(source)? {
            return Ok(failed);
        }
        let classification = session.classify(source)?;
        session.synthesize(&classification)
    }
}

// ============================================================================
// Tests
// ============================================================================
