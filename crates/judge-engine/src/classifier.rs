//! Source classification.
//!
//! Scans submitted text for the structural signals the rest of the engine
//! needs: whether a program entry point is present, whether output statements
//! are present, and which quoted literals those statements print. This is a
//! substring/pattern scan, never a parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Token that marks an output statement.
pub const OUTPUT_TOKEN: &str = "System.out.println";

/// Token that marks a program entry point.
///
/// Matches both `public static void main(String[] args)` and `void main()`.
pub const ENTRY_POINT_TOKEN: &str = "void main";

/// Character that terminates a statement.
pub const STATEMENT_TERMINATOR: char = ';';

/// `System.out.println("...")` with the literal in group 1. `.` stops at a
/// newline, so each occurrence is matched within its own line.
static PRINTLN_LITERAL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"System\.out\.println\("(.*?)"\)"#).ok());

/// Prompt patterns, tried in order.
static PROMPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"input\("([^"]+)"\)"#,
        r#"scanf\("([^"]+)""#,
        r#"System\.out\.print(?:ln)?\("([^"]+)"\)"#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Structural signals extracted from one source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Whether the entry-point token occurs.
    pub has_entry_point: bool,
    /// Whether the output-statement token occurs.
    pub has_output_statement: bool,
    /// Literal arguments of output statements, in source order.
    pub printed_literals: Vec<String>,
}

/// What a classification says about the program's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind<'a> {
    /// Output statements with these literal arguments.
    Literals(&'a [String]),
    /// Output statements present, but no literal could be extracted.
    Unknown,
    /// Entry point present, no output statements.
    Silent,
    /// Neither an entry point nor output statements.
    None,
}

impl Classification {
    /// Reduces the classification to the branch the synthesizer takes.
    #[must_use]
    pub fn output_kind(&self) -> OutputKind<'_> {
        if self.has_output_statement {
            if self.printed_literals.is_empty() {
                OutputKind::Unknown
            } else {
                OutputKind::Literals(&self.printed_literals)
            }
        } else if self.has_entry_point {
            OutputKind::Silent
        } else {
            OutputKind::None
        }
    }
}

/// Classifies submitted source text.
///
/// # Examples
///
/// ```
/// use judge_engine::classifier::classify;
///
/// let source = r#"public class X { void main(){ System.out.println("Hi"); } }"#;
/// let classification = classify(source);
///
/// assert!(classification.has_entry_point);
/// assert_eq!(classification.printed_literals, vec!["Hi"]);
/// ```
#[must_use]
pub fn classify(source: &str) -> Classification {
    let has_output_statement = source.contains(OUTPUT_TOKEN);
    let printed_literals = if has_output_statement {
        extract_literals(source)
    } else {
        Vec::new()
    };

    Classification {
        has_entry_point: source.contains(ENTRY_POINT_TOKEN),
        has_output_statement,
        printed_literals,
    }
}

fn extract_literals(source: &str) -> Vec<String> {
    let Some(re) = PRINTLN_LITERAL.as_ref() else {
        return Vec::new();
    };

    re.captures_iter(source)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Detects the label a program prints before it reads input.
///
/// Checks, in order, `input("label")`, `scanf("label"` and
/// `System.out.print("label")` / `System.out.println("label")`, returning the
/// first label found.
///
/// # Examples
///
/// ```
/// use judge_engine::classifier::input_prompt;
///
/// let source = r#"System.out.print("Enter a number: "); int n = sc.nextInt();"#;
/// assert_eq!(input_prompt(source).as_deref(), Some("Enter a number: "));
/// assert_eq!(input_prompt("int x = 1;"), None);
/// ```
#[must_use]
pub fn input_prompt(source: &str) -> Option<String> {
    PROMPT_PATTERNS.iter().find_map(|re| {
        re.captures(source)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    })
}
