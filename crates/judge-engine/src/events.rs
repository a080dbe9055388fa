//! Judge events and the publishing interface.
//!
//! The engine reports progress through an injected [`EventPublisher`] instead
//! of process-wide listener registries. [`EventBroadcaster`] fans events out
//! over a tokio broadcast channel; [`NoopPublisher`] discards them.
//!
//! # Example
//!
//! ```no_run
//! use judge_engine::events::{EventBroadcaster, EventPublisher, JudgeEvent};
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(100);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.publish(JudgeEvent::session_started(1));
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::verdict::{DiagnosticKind, JudgingResult, SubmissionStatus, Verdict};

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    /// Server time at connection.
    pub server_time: DateTime<Utc>,
}

/// Payload for the `session_started` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedPayload {
    /// Identifier of the session, unique per judge.
    pub session_id: u64,
    /// When the session started.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `verdict_ready` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictReadyPayload {
    /// Identifier of the session that produced the verdict.
    pub session_id: u64,
    /// Whether the verdict succeeded.
    pub succeeded: bool,
    /// Diagnostic kind of a failed verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<DiagnosticKind>,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Payload for the `submission_graded` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionGradedPayload {
    /// Problem the submission was graded against.
    pub problem_id: u64,
    /// Aggregate status.
    pub status: SubmissionStatus,
    /// Fixtures passed.
    pub passed: usize,
    /// Fixtures checked.
    pub total: usize,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Events emitted while judging.
///
/// Serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum JudgeEvent {
    /// Sent to a stream subscriber when it connects.
    Connected(ConnectedPayload),
    /// A judging session entered validation.
    SessionStarted(SessionStartedPayload),
    /// A judging session reached a terminal state.
    VerdictReady(VerdictReadyPayload),
    /// A verdict was evaluated against a problem's fixtures.
    SubmissionGraded(SubmissionGradedPayload),
}

impl JudgeEvent {
    /// Creates a `Connected` event.
    #[must_use]
    pub fn connected() -> Self {
        Self::Connected(ConnectedPayload {
            server_time: Utc::now(),
        })
    }

    /// Creates a `SessionStarted` event.
    #[must_use]
    pub fn session_started(session_id: u64) -> Self {
        Self::SessionStarted(SessionStartedPayload {
            session_id,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `VerdictReady` event from a verdict.
    #[must_use]
    pub fn verdict_ready(session_id: u64, verdict: &Verdict) -> Self {
        Self::VerdictReady(VerdictReadyPayload {
            session_id,
            succeeded: verdict.succeeded(),
            diagnostic: verdict.diagnostic().map(|d| d.kind),
            elapsed_ms: u64::try_from(verdict.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Creates a `SubmissionGraded` event from a judging result.
    #[must_use]
    pub fn submission_graded(problem_id: u64, result: &JudgingResult) -> Self {
        Self::SubmissionGraded(SubmissionGradedPayload {
            problem_id,
            status: result.status,
            passed: result.passed_count(),
            total: result.fixture_results.len(),
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::SessionStarted(_) => "session_started",
            Self::VerdictReady(_) => "verdict_ready",
            Self::SubmissionGraded(_) => "submission_graded",
        }
    }
}

// ============================================================================
// Publishers
// ============================================================================

/// Sink for judge events.
pub trait EventPublisher: Send + Sync + std::fmt::Debug {
    /// Publishes one event. Must not block.
    fn publish(&self, event: JudgeEvent);
}

/// Publisher that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: JudgeEvent) {}
}

/// Broadcasts judge events to every subscriber.
///
/// Events are not persisted for subscribers that join later.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<JudgeEvent>,
}

impl EventBroadcaster {
    /// Creates a new `EventBroadcaster` with the specified buffer capacity.
    ///
    /// The buffer determines how many events can be queued per subscriber
    /// before old events are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a new subscriber for receiving events.
    ///
    /// A subscriber that falls behind receives a `Lagged` error and misses events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JudgeEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event, returning how many subscribers will receive it.
    pub fn send(&self, event: JudgeEvent) -> usize {
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EventPublisher for EventBroadcaster {
    fn publish(&self, event: JudgeEvent) {
        self.send(event);
    }
}
