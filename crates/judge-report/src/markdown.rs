//! Markdown grading reports.
//!
//! The generated document has a summary table, the diagnostic (if any), the
//! simulated output, a fixture table and suggestions.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::{FixtureEntry, GradingReport};

/// Maximum length for a fixture cell before it is truncated.
const MAX_CELL_LENGTH: usize = 60;

/// Generates Markdown reports from graded submissions.
pub struct MarkdownGenerator<'a> {
    report: &'a GradingReport,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a GradingReport) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_diagnostic(&mut output);
        self.write_output(&mut output);
        self.write_fixtures(&mut output);
        self.write_suggestions(&mut output);
        self.write_footer(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(
            output,
            "# Grading Report: {}\n",
            escape_markdown(&self.report.title)
        );
    }

    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(
            output,
            "| Status | {} {} |",
            status_icon(summary.status.is_accepted()),
            summary.status.description()
        );
        let _ = writeln!(
            output,
            "| Fixtures Passed | {}/{} |",
            summary.passed, summary.total
        );
        let _ = writeln!(output, "| Elapsed | {} |", summary.elapsed_label);
        if let Some(path) = &self.report.source_path {
            let _ = writeln!(output, "| Source | {} |", escape_markdown(path));
        }
        let _ = writeln!(output);
    }

    fn write_diagnostic(&self, output: &mut String) {
        let Some(diagnostic) = &self.report.diagnostic else {
            return;
        };

        let _ = writeln!(output, "## Diagnostic\n");
        let _ = writeln!(output, "**{}**: {}\n", diagnostic.kind, diagnostic.message);
    }

    fn write_output(&self, output: &mut String) {
        let _ = writeln!(output, "## Output\n");

        if self.report.simulated_output.is_empty() {
            let _ = writeln!(output, "*No output.*\n");
            return;
        }

        let _ = writeln!(output, "```text");
        let _ = writeln!(output, "{}", self.report.simulated_output);
        let _ = writeln!(output, "```\n");
    }

    fn write_fixtures(&self, output: &mut String) {
        let _ = writeln!(output, "## Fixtures\n");

        if self.report.fixtures.is_empty() {
            let _ = writeln!(output, "*This problem has no fixtures.*\n");
            return;
        }

        let _ = writeln!(output, "| # | Input | Expected | Result |");
        let _ = writeln!(output, "|---|-------|----------|--------|");
        for fixture in &self.report.fixtures {
            Self::write_fixture_row(output, fixture);
        }
        let _ = writeln!(output);
    }

    fn write_fixture_row(output: &mut String, fixture: &FixtureEntry) {
        let input = if fixture.input.is_empty() {
            "*(none)*".to_string()
        } else {
            escape_markdown(&truncate(&fixture.input, MAX_CELL_LENGTH))
        };
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} |",
            fixture.index,
            input,
            escape_markdown(&truncate(&fixture.expected_output, MAX_CELL_LENGTH)),
            if fixture.passed {
                format!("{} Passed", status_icon(true))
            } else {
                format!("{} Failed", status_icon(false))
            }
        );
    }

    fn write_suggestions(&self, output: &mut String) {
        if self.report.suggestions.is_empty() {
            return;
        }

        let _ = writeln!(output, "## Suggestions\n");
        for suggestion in &self.report.suggestions {
            let _ = writeln!(output, "- {suggestion}");
        }
        let _ = writeln!(output);
    }

    fn write_footer(&self, output: &mut String) {
        let _ = writeln!(output, "---");
        let timestamp = format_timestamp(&self.report.generated_at);
        let _ = writeln!(output, "*Generated by judge at {timestamp}*");
    }
}

/// Formats a timestamp as "YYYY-MM-DD HH:MM:SS UTC".
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// HTML entity for a pass or fail mark.
const fn status_icon(passed: bool) -> &'static str {
    if passed {
        "&#9989;"
    } else {
        "&#10060;"
    }
}

/// Escapes special Markdown characters so user text renders literally.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}

/// Truncates to `max_length` bytes on a char boundary, adding an ellipsis.
fn truncate(text: &str, max_length: usize) -> String {
    if text.len() <= max_length {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .take_while(|(idx, _)| *idx < max_length)
        .last()
        .map_or(0, |(idx, c)| idx + c.len_utf8());
    format!("{}...", &text[..cut])
}
