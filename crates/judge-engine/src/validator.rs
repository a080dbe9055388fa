//! Structural validation.
//!
//! Rules are checked in a fixed priority order and the first one that fires
//! is the only diagnostic reported:
//!
//! 1. `{` present, `}` absent → [`DiagnosticKind::UnbalancedBraceOpen`]
//! 2. `}` present, `{` absent → [`DiagnosticKind::UnbalancedBraceClose`]
//! 3. output statement present, `;` absent → [`DiagnosticKind::MissingStatementTerminator`]
//! 4. entry point absent → [`DiagnosticKind::MissingEntryPoint`]
//!
//! Only presence and absence are checked; braces are not counted or nested.

use crate::classifier::{ENTRY_POINT_TOKEN, OUTPUT_TOKEN, STATEMENT_TERMINATOR};
use crate::verdict::{Diagnostic, DiagnosticKind};

/// Returns the kind of the first rule the text violates.
#[must_use]
pub fn check(source: &str) -> Option<DiagnosticKind> {
    let has_open = source.contains('{');
    let has_close = source.contains('}');

    if has_open && !has_close {
        Some(DiagnosticKind::UnbalancedBraceOpen)
    } else if has_close && !has_open {
        Some(DiagnosticKind::UnbalancedBraceClose)
    } else if source.contains(OUTPUT_TOKEN) && !source.contains(STATEMENT_TERMINATOR) {
        Some(DiagnosticKind::MissingStatementTerminator)
    } else if !source.contains(ENTRY_POINT_TOKEN) {
        Some(DiagnosticKind::MissingEntryPoint)
    } else {
        None
    }
}

/// Validates source text, returning at most one diagnostic.
///
/// # Examples
///
/// ```
/// use judge_engine::validator::validate;
/// use judge_engine::DiagnosticKind;
///
/// let diagnostic = validate("public class X { void main(){").unwrap();
/// assert_eq!(diagnostic.kind, DiagnosticKind::UnbalancedBraceOpen);
///
/// assert!(validate("class X { void main() { } }").is_none());
/// ```
#[must_use]
pub fn validate(source: &str) -> Option<Diagnostic> {
    check(source).map(Diagnostic::new)
}
