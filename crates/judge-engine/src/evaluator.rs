//! Fixture evaluation.
//!
//! A fixture passes when the verdict succeeded and its simulated output
//! contains the expected output as a substring. Extra surrounding text is
//! allowed. The verdict is not re-run per fixture: the heuristic output does
//! not depend on stdin.

use serde::{Deserialize, Serialize};

use crate::verdict::{FixtureResult, JudgingResult, SubmissionStatus, TestFixture, Verdict};

/// How a problem with no fixtures is graded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyFixturePolicy {
    /// A successful verdict is accepted when there is nothing to check (default).
    #[default]
    AcceptOnSuccess,
    /// A problem without fixtures never accepts a submission.
    Reject,
}

impl EmptyFixturePolicy {
    /// Parses a policy name, case-insensitively.
    ///
    /// Accepts `accept` and `reject`.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "accept" => Some(Self::AcceptOnSuccess),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    /// The policy's configuration name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AcceptOnSuccess => "accept",
            Self::Reject => "reject",
        }
    }
}

impl<'de> Deserialize<'de> for EmptyFixturePolicy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid empty fixture policy '{s}': expected one of 'accept', 'reject'"
            ))
        })
    }
}

impl Serialize for EmptyFixturePolicy {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Evaluates a verdict against fixtures using the default policy.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use judge_engine::{evaluate, SubmissionStatus, TestFixture, Verdict};
///
/// let verdict = Verdict::success("Hello, World!", Duration::ZERO);
/// let result = evaluate(&verdict, &[TestFixture::new("", "World")]);
///
/// assert!(result.fixture_results[0].passed);
/// assert_eq!(result.status, SubmissionStatus::Accepted);
/// ```
#[must_use]
pub fn evaluate(verdict: &Verdict, fixtures: &[TestFixture]) -> JudgingResult {
    evaluate_with_policy(verdict, fixtures, EmptyFixturePolicy::default())
}

/// Evaluates a verdict against fixtures, in fixture order.
#[must_use]
pub fn evaluate_with_policy(
    verdict: &Verdict,
    fixtures: &[TestFixture],
    policy: EmptyFixturePolicy,
) -> JudgingResult {
    let fixture_results: Vec<FixtureResult> = fixtures
        .iter()
        .map(|fixture| FixtureResult {
            fixture: fixture.clone(),
            passed: verdict.succeeded()
                && verdict
                    .simulated_output()
                    .contains(fixture.expected_output.as_str()),
        })
        .collect();

    let status = if !verdict.succeeded() {
        SubmissionStatus::Failed
    } else if fixture_results.is_empty() {
        match policy {
            EmptyFixturePolicy::AcceptOnSuccess => SubmissionStatus::Accepted,
            EmptyFixturePolicy::Reject => SubmissionStatus::WrongAnswer,
        }
    } else if fixture_results.iter().any(|r| r.passed) {
        SubmissionStatus::Accepted
    } else {
        SubmissionStatus::WrongAnswer
    };

    JudgingResult {
        verdict: verdict.clone(),
        fixture_results,
        status,
    }
}
