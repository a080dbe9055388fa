//! JSON grading reports.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use judge_engine::{evaluate, Verdict};
//! use judge_report::{json::JsonGenerator, GradingReport};
//!
//! let result = evaluate(&Verdict::success("Hi", Duration::ZERO), &[]);
//! let report = GradingReport::from_result("Greeting", &result).unwrap();
//!
//! let compact = JsonGenerator::new(&report).generate().unwrap();
//! assert!(!compact.contains('\n'));
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::{GradingReport, ReportError, Result};

/// JSON report generator.
pub struct JsonGenerator<'a> {
    report: &'a GradingReport,
}

impl<'a> JsonGenerator<'a> {
    /// Creates a new JSON generator for the given report.
    #[must_use]
    pub const fn new(report: &'a GradingReport) -> Self {
        Self { report }
    }

    /// Generates compact JSON output (single line, no extra whitespace).
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.report).map_err(ReportError::from)
    }

    /// Generates pretty-printed JSON output with indentation.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.report).map_err(ReportError::from)
    }

    /// Writes the JSON report to a file, creating or overwriting it.
    ///
    /// Parent directories must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if JSON serialization fails.
    /// Returns [`ReportError::Io`] if file creation or writing fails.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}
