//! Simulated stdout.

use crate::classifier::{Classification, OutputKind};

/// Output reported when output statements exist but no literal was extracted.
pub const UNKNOWN_OUTPUT: &str = "Output generated (simulated)";

/// Output reported for a program with an entry point and no output statements.
pub const SILENT_OUTPUT: &str = "Program executed successfully, but no output was generated.";

/// Builds the simulated stdout for a classification.
///
/// Returns `None` only when the classification has neither an entry point nor
/// an output statement, which validation already rejects.
///
/// # Examples
///
/// ```
/// use judge_engine::classifier::classify;
/// use judge_engine::synthesizer::synthesize;
///
/// let c = classify(r#"void main() { System.out.println("a"); System.out.println("b"); }"#);
/// assert_eq!(synthesize(&c).as_deref(), Some("a\nb"));
/// ```
#[must_use]
pub fn synthesize(classification: &Classification) -> Option<String> {
    match classification.output_kind() {
        OutputKind::Literals(literals) => Some(literals.join("\n")),
        OutputKind::Unknown => Some(UNKNOWN_OUTPUT.to_string()),
        OutputKind::Silent => Some(SILENT_OUTPUT.to_string()),
        OutputKind::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;

    #[test]
    fn test_literals_joined_by_newline() {
        let c = Classification {
            has_entry_point: true,
            has_output_statement: true,
            printed_literals: vec!["one".to_string(), "two".to_string()],
        };
        assert_eq!(synthesize(&c).as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_unknown_content_sentinel() {
        let c = classify(r#"void main() { System.out.println(x); }"#);
        assert_eq!(synthesize(&c).as_deref(), Some(UNKNOWN_OUTPUT));
    }

    #[test]
    fn test_silent_program_sentinel() {
        let c = classify("public static void main(String[] a) { }");
        assert_eq!(synthesize(&c).as_deref(), Some(SILENT_OUTPUT));
    }

    #[test]
    fn test_nothing_recognized() {
        assert_eq!(synthesize(&Classification::default()), None);
    }

    #[test]
    fn test_output_statement_without_entry_point_still_synthesizes() {
        // Validation rejects this case; the synthesizer itself only looks at output.
        let c = classify(r#"System.out.println("loose");"#);
        assert_eq!(synthesize(&c).as_deref(), Some("loose"));
    }
}
