//! Grading Report Generation
//!
//! Turns a [`JudgingResult`] into a [`GradingReport`] that can be serialized
//! to JSON for programmatic access or rendered to Markdown for a learner.
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - Compact or pretty JSON
//! - [`MarkdownGenerator`] - Human-readable Markdown
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use judge_engine::{evaluate, TestFixture, Verdict};
//! use judge_report::{GradingReport, MarkdownGenerator};
//!
//! let verdict = Verdict::success("Hello, World!", Duration::from_millis(1000));
//! let result = evaluate(&verdict, &[TestFixture::new("", "Hello, World!")]);
//!
//! let report = GradingReport::from_result("Hello World", &result).unwrap();
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# Grading Report: Hello World"));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use judge_engine::synthesizer::UNKNOWN_OUTPUT;
use judge_engine::{Diagnostic, DiagnosticKind, JudgingResult, SubmissionStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write the report file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid report data.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Report
// ============================================================================

/// A graded submission, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingReport {
    /// What was graded, usually the problem title.
    pub title: String,

    /// File the source text was read from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,

    /// Headline figures.
    pub summary: ReportSummary,

    /// Why the verdict failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,

    /// Simulated stdout.
    pub simulated_output: String,

    /// One entry per fixture, in fixture order.
    pub fixtures: Vec<FixtureEntry>,

    /// Hints for improving the submission.
    pub suggestions: Vec<String>,

    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}

impl GradingReport {
    /// Builds a report from a judging result.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidData` if `title` is blank.
    pub fn from_result(title: impl Into<String>, result: &JudgingResult) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ReportError::InvalidData("title is required".to_string()));
        }

        let verdict = &result.verdict;
        let fixtures = result
            .fixture_results
            .iter()
            .enumerate()
            .map(|(i, r)| FixtureEntry {
                index: i + 1,
                input: r.fixture.input.clone(),
                expected_output: r.fixture.expected_output.clone(),
                passed: r.passed,
            })
            .collect();

        Ok(Self {
            title,
            source_path: None,
            summary: ReportSummary {
                status: result.status,
                succeeded: verdict.succeeded(),
                passed: result.passed_count(),
                total: result.fixture_results.len(),
                elapsed_label: verdict.elapsed_label(),
            },
            diagnostic: verdict.diagnostic().cloned(),
            simulated_output: verdict.simulated_output().to_string(),
            fixtures,
            suggestions: suggestions_for(result),
            generated_at: Utc::now(),
        })
    }

    /// Records the file the source text came from.
    #[must_use]
    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Fixtures that did not pass.
    pub fn failing_fixtures(&self) -> impl Iterator<Item = &FixtureEntry> {
        self.fixtures.iter().filter(|f| !f.passed)
    }
}

/// Headline figures of a graded submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Aggregate status.
    pub status: SubmissionStatus,
    /// Whether the verdict succeeded.
    pub succeeded: bool,
    /// Fixtures passed.
    pub passed: usize,
    /// Fixtures checked.
    pub total: usize,
    /// Elapsed time label, e.g. `"1.00s"`.
    pub elapsed_label: String,
}

/// One fixture in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureEntry {
    /// 1-based position.
    pub index: usize,
    /// Stdin of the fixture.
    pub input: String,
    /// Text the output had to contain.
    pub expected_output: String,
    /// Whether it did.
    pub passed: bool,
}

/// Hint for fixing a diagnostic.
const fn diagnostic_hint(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::MissingEntryPoint => {
            "Add an entry point such as `public static void main(String[] args)`."
        }
        DiagnosticKind::UnbalancedBraceOpen => "Close every block with a matching `}`.",
        DiagnosticKind::UnbalancedBraceClose => "Open every block with a matching `{`.",
        DiagnosticKind::MissingStatementTerminator => "End each statement with `;`.",
        DiagnosticKind::TimedOut => "Simplify the program or raise the configured timeout.",
    }
}

fn suggestions_for(result: &JudgingResult) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let Some(diagnostic) = result.verdict.diagnostic() {
        suggestions.push(diagnostic_hint(diagnostic.kind).to_string());
        return suggestions;
    }

    if result.verdict.simulated_output() == UNKNOWN_OUTPUT {
        suggestions.push(
            "Print string literals directly, e.g. `System.out.println(\"text\")`, so the output can be predicted."
                .to_string(),
        );
    }

    if result.status == SubmissionStatus::WrongAnswer && !result.fixture_results.is_empty() {
        suggestions
            .push("Compare your output with the expected output of each failing fixture.".to_string());
    }

    suggestions
}
