//! Graded submission records.
//!
//! Identity lives here and never reaches the engine: the API attaches the
//! user id to a record only after judging is done.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use judge_engine::SubmissionStatus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// One graded submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Who submitted.
    pub user_id: String,
    /// Which problem was attempted.
    pub problem_id: u64,
    /// The submitted source text.
    pub source_text: String,
    /// Aggregate grading status.
    pub status: SubmissionStatus,
    /// When the submission was graded.
    pub timestamp: DateTime<Utc>,
}

impl Submission {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        problem_id: u64,
        source_text: impl Into<String>,
        status: SubmissionStatus,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            problem_id,
            source_text: source_text.into(),
            status,
            timestamp: Utc::now(),
        }
    }
}

/// Destination for graded submissions.
pub trait SubmissionSink: Send + Sync + std::fmt::Debug {
    /// Stores one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be stored.
    fn record(&self, submission: Submission) -> Result<()>;

    /// Records belonging to one user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the records could not be read.
    fn history(&self, user_id: &str) -> Result<Vec<Submission>>;
}

/// Aggregate figures over a user's submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Submissions made.
    pub total: usize,
    /// Submissions accepted.
    pub accepted: usize,
    /// Distinct problems attempted.
    pub problems_attempted: usize,
    /// Accepted share of all submissions, rounded to a whole percent.
    pub success_rate: u32,
}

impl UserStats {
    /// Computes statistics over `submissions`.
    #[must_use]
    pub fn from_submissions(submissions: &[Submission]) -> Self {
        let total = submissions.len();
        let accepted = submissions.iter().filter(|s| s.status.is_accepted()).count();

        let mut problems: Vec<u64> = submissions.iter().map(|s| s.problem_id).collect();
        problems.sort_unstable();
        problems.dedup();

        let success_rate = if total == 0 {
            0
        } else {
            u32::try_from((accepted * 100 + total / 2) / total).unwrap_or(100)
        };

        Self {
            total,
            accepted,
            problems_attempted: problems.len(),
            success_rate,
        }
    }
}

/// Keeps submissions in memory for the life of the process.
#[derive(Debug, Default)]
pub struct InMemorySubmissionLog {
    entries: Mutex<Vec<Submission>>,
}

impl InMemorySubmissionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records belonging to one user, oldest first.
    #[must_use]
    pub fn for_user(&self, user_id: &str) -> Vec<Submission> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SubmissionSink for InMemorySubmissionLog {
    fn record(&self, submission: Submission) -> Result<()> {
        debug!(
            user_id = %submission.user_id,
            problem_id = submission.problem_id,
            status = %submission.status,
            "Recording submission"
        );
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(submission);
        Ok(())
    }

    fn history(&self, user_id: &str) -> Result<Vec<Submission>> {
        Ok(self.for_user(user_id))
    }
}
