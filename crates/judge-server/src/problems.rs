//! Problems and their fixtures.
//!
//! A [`ProblemStore`] supplies the problem set. [`FileProblemStore`] reads a
//! JSON file, [`StaticProblemStore`] serves the built-in problems, and
//! [`FallbackProblemStore`] serves the built-in problems whenever its primary
//! store fails.
//!
//! Problems may carry fixtures explicitly or as free text in the legacy
//! `testCases` field:
//!
//! ```text
//! Input: 10 5
//! Output: 15
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use judge_engine::TestFixture;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ServerError};

// ============================================================================
// Difficulty
// ============================================================================

/// Difficulty rating of a problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Easy (default).
    #[default]
    Easy,
    /// Medium.
    Medium,
    /// Hard.
    Hard,
}

impl Difficulty {
    /// Parses a difficulty, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// The lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid difficulty '{s}': expected one of 'easy', 'medium', 'hard'"
            ))
        })
    }
}

impl Serialize for Difficulty {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================================================
// Problem
// ============================================================================

/// A teaching exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    /// Unique identifier.
    pub id: u64,
    /// Short title.
    pub title: String,
    /// What the learner must do.
    #[serde(default)]
    pub description: String,
    /// Concepts exercised.
    #[serde(default)]
    pub concept: String,
    /// Curriculum category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Difficulty rating.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Code placed in the editor initially.
    #[serde(default, alias = "starter_code")]
    pub starter_code: String,
    /// Free-text test description, parsed into fixtures when none are given.
    #[serde(default, alias = "test_cases", skip_serializing_if = "Option::is_none")]
    pub test_cases: Option<String>,
    /// Fixtures the submission is graded against.
    #[serde(default)]
    pub fixtures: Vec<TestFixture>,
    /// Reference solution. Never sent to clients.
    #[serde(default, skip_serializing)]
    pub solution: Option<String>,
    /// When the problem was created.
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Problem {
    /// Fills `fixtures` from the legacy `test_cases` text when it is empty.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.fixtures.is_empty() {
            if let Some(text) = self.test_cases.as_deref() {
                self.fixtures = parse_legacy_fixtures(text);
            }
        }
        self
    }

    /// A summary suitable for listings.
    #[must_use]
    pub fn summary(&self) -> ProblemSummary {
        ProblemSummary {
            id: self.id,
            title: self.title.clone(),
            concept: self.concept.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty,
            fixture_count: self.fixtures.len(),
        }
    }
}

/// Listing view of a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    /// Unique identifier.
    pub id: u64,
    /// Short title.
    pub title: String,
    /// Concepts exercised.
    pub concept: String,
    /// Curriculum category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Difficulty rating.
    pub difficulty: Difficulty,
    /// Number of fixtures attached.
    pub fixture_count: usize,
}

/// Filters applied to a problem listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemQuery {
    /// Case-insensitive substring of the title or concept.
    #[serde(default)]
    pub search: Option<String>,
    /// Exact difficulty.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Exact category.
    #[serde(default)]
    pub category: Option<String>,
}

impl ProblemQuery {
    /// Returns `true` if the problem passes every filter that is set.
    #[must_use]
    pub fn matches(&self, problem: &Problem) -> bool {
        let matches_search = self.search.as_deref().map_or(true, |query| {
            let query = query.to_lowercase();
            problem.title.to_lowercase().contains(&query)
                || problem.concept.to_lowercase().contains(&query)
        });
        let matches_difficulty = self.difficulty.map_or(true, |d| problem.difficulty == d);
        let matches_category = self
            .category
            .as_deref()
            .map_or(true, |c| problem.category.as_deref() == Some(c));

        matches_search && matches_difficulty && matches_category
    }
}

/// Parses legacy free-text test cases into fixtures.
///
/// Each `Input:` line sets the input for the fixtures that follow; each
/// `Output:` line emits one fixture. Other lines are ignored.
///
/// # Examples
///
/// ```
/// use judge_server::problems::parse_legacy_fixtures;
///
/// let fixtures = parse_legacy_fixtures("Input: 10 5\nOutput: 15");
/// assert_eq!(fixtures.len(), 1);
/// assert_eq!(fixtures[0].input, "10 5");
/// assert_eq!(fixtures[0].expected_output, "15");
/// ```
#[must_use]
pub fn parse_legacy_fixtures(text: &str) -> Vec<TestFixture> {
    let mut pending_input = String::new();
    let mut fixtures = Vec::new();

    for line in text.lines().map(str::trim) {
        if let Some(input) = line.strip_prefix("Input:") {
            pending_input = input.trim().to_string();
        } else if let Some(output) = line.strip_prefix("Output:") {
            fixtures.push(TestFixture::new(pending_input.clone(), output.trim()));
        }
    }

    fixtures
}

// ============================================================================
// Stores
// ============================================================================

/// Source of problems.
pub trait ProblemStore: Send + Sync + std::fmt::Debug {
    /// All problems, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a store error if the backing data cannot be read.
    fn list(&self) -> Result<Vec<Problem>>;

    /// One problem by id, or `None` if no such problem exists.
    ///
    /// # Errors
    ///
    /// Returns a store error if the backing data cannot be read.
    fn get(&self, id: u64) -> Result<Option<Problem>> {
        Ok(self.list()?.into_iter().find(|p| p.id == id))
    }
}

/// Problems read from a JSON file on every request.
#[derive(Debug, Clone)]
pub struct FileProblemStore {
    path: PathBuf,
}

impl FileProblemStore {
    /// Creates a store backed by `path`. The file is not read until used.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProblemStore for FileProblemStore {
    fn list(&self) -> Result<Vec<Problem>> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ServerError::store_unavailable(&self.path, e.to_string()))?;

        let problems: Vec<Problem> = serde_json::from_str(&contents)
            .map_err(|e| ServerError::store_corrupted(&self.path, e.to_string()))?;

        let mut problems: Vec<Problem> = problems.into_iter().map(Problem::normalized).collect();
        problems.sort_by_key(|p| p.id);

        debug!(path = %self.path.display(), count = problems.len(), "Loaded problems");
        Ok(problems)
    }
}

/// The built-in problem set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProblemStore;

impl ProblemStore for StaticProblemStore {
    fn list(&self) -> Result<Vec<Problem>> {
        Ok(STATIC_PROBLEMS.clone())
    }
}

/// Serves a primary store, falling back to the built-in set on store errors.
#[derive(Debug)]
pub struct FallbackProblemStore {
    primary: Box<dyn ProblemStore>,
    fallback: StaticProblemStore,
}

impl FallbackProblemStore {
    /// Wraps `primary`.
    #[must_use]
    pub fn new(primary: Box<dyn ProblemStore>) -> Self {
        Self {
            primary,
            fallback: StaticProblemStore,
        }
    }
}

impl ProblemStore for FallbackProblemStore {
    fn list(&self) -> Result<Vec<Problem>> {
        match self.primary.list() {
            Err(e) if e.is_store_error() => {
                warn!(error = %e, "Problem store failed, serving built-in problems");
                self.fallback.list()
            }
            other => other,
        }
    }

    fn get(&self, id: u64) -> Result<Option<Problem>> {
        match self.primary.get(id) {
            Err(e) if e.is_store_error() => {
                warn!(error = %e, id, "Problem store failed, serving built-in problems");
                self.fallback.get(id)
            }
            other => other,
        }
    }
}

// ============================================================================
// Built-in problems
// ============================================================================

fn timestamp(s: &str) -> Option<DateTime<Utc>> {
    s.parse().ok()
}

static STATIC_PROBLEMS: Lazy<Vec<Problem>> = Lazy::new(|| {
    vec![
        Problem {
            id: 1,
            title: "Hello World".to_string(),
            description: r#"Write a program that prints "Hello, World!" to the console"#.to_string(),
            concept: "Basic program structure, System.out.println()".to_string(),
            category: None,
            difficulty: Difficulty::Easy,
            starter_code: "public class HelloWorld {\n  public static void main(String[] args) {\n    // Your code here\n  }\n}".to_string(),
            test_cases: Some("Output: Hello, World!".to_string()),
            fixtures: Vec::new(),
            solution: Some("public class HelloWorld {\n  public static void main(String[] args) {\n    System.out.println(\"Hello, World!\");\n  }\n}".to_string()),
            created_at: timestamp("2023-01-01T00:00:00Z"),
        },
        Problem {
            id: 2,
            title: "Variable Declaration".to_string(),
            description: "Create variables to store your name, age, and height (in meters)".to_string(),
            concept: "Variable declaration, primitive data types".to_string(),
            category: None,
            difficulty: Difficulty::Easy,
            starter_code: "public class Variables {\n  public static void main(String[] args) {\n    // Declare your variables here\n    \n    // Print them out\n  }\n}".to_string(),
            test_cases: Some("Output should include string, int, and double values".to_string()),
            fixtures: Vec::new(),
            solution: Some("public class Variables {\n  public static void main(String[] args) {\n    String name = \"John Doe\";\n    int age = 25;\n    double height = 1.75;\n    \n    System.out.println(\"Name: \" + name);\n    System.out.println(\"Age: \" + age);\n    System.out.println(\"Height: \" + height + \" meters\");\n  }\n}".to_string()),
            created_at: timestamp("2023-01-02T00:00:00Z"),
        },
        Problem {
            id: 3,
            title: "Simple Calculator".to_string(),
            description: "Write a program that takes two numbers and performs addition, subtraction, multiplication, and division".to_string(),
            concept: "Arithmetic operators, basic input/output".to_string(),
            category: None,
            difficulty: Difficulty::Easy,
            starter_code: "import java.util.Scanner;\n\npublic class Calculator {\n  public static void main(String[] args) {\n    Scanner scanner = new Scanner(System.in);\n    \n    // Get user input\n    \n    // Perform calculations\n    \n    // Print results\n  }\n}".to_string(),
            test_cases: Some("Input: 10 5\nOutput should show sum, difference, product, and quotient".to_string()),
            fixtures: Vec::new(),
            solution: Some("import java.util.Scanner;\n\npublic class Calculator {\n  public static void main(String[] args) {\n    Scanner scanner = new Scanner(System.in);\n    \n    System.out.print(\"Enter first number: \");\n    double num1 = scanner.nextDouble();\n    \n    System.out.print(\"Enter second number: \");\n    double num2 = scanner.nextDouble();\n    \n    System.out.println(\"Sum: \" + (num1 + num2));\n    System.out.println(\"Difference: \" + (num1 - num2));\n    System.out.println(\"Product: \" + (num1 * num2));\n    System.out.println(\"Quotient: \" + (num1 / num2));\n    \n    scanner.close();\n  }\n}".to_string()),
            created_at: timestamp("2023-01-03T00:00:00Z"),
        },
        Problem {
            id: 4,
            title: "Conditional Statements".to_string(),
            description: "Write a program that determines if a number is positive, negative, or zero".to_string(),
            concept: "If-else statements, conditional logic".to_string(),
            category: None,
            difficulty: Difficulty::Easy,
            starter_code: "import java.util.Scanner;\n\npublic class Conditions {\n  public static void main(String[] args) {\n    Scanner scanner = new Scanner(System.in);\n    \n    // Get user input\n    \n    // Check if positive, negative, or zero\n    \n    scanner.close();\n  }\n}".to_string(),
            test_cases: Some("Test with values: 5, -3, 0".to_string()),
            fixtures: Vec::new(),
            solution: Some("import java.util.Scanner;\n\npublic class Conditions {\n  public static void main(String[] args) {\n    Scanner scanner = new Scanner(System.in);\n    \n    System.out.print(\"Enter a number: \");\n    int number = scanner.nextInt();\n    \n    if (number > 0) {\n      System.out.println(\"The number is positive.\");\n    } else if (number < 0) {\n      System.out.println(\"The number is negative.\");\n    } else {\n      System.out.println(\"The number is zero.\");\n    }\n    \n    scanner.close();\n  }\n}".to_string()),
            created_at: timestamp("2023-01-04T00:00:00Z"),
        },
        Problem {
            id: 5,
            title: "Loops".to_string(),
            description: "Write a program that prints the first 10 numbers in the Fibonacci sequence".to_string(),
            concept: "Loops, sequence generation".to_string(),
            category: None,
            difficulty: Difficulty::Medium,
            starter_code: "public class Fibonacci {\n  public static void main(String[] args) {\n    // Print the first 10 Fibonacci numbers\n  }\n}".to_string(),
            test_cases: Some("Output: 0, 1, 1, 2, 3, 5, 8, 13, 21, 34".to_string()),
            fixtures: Vec::new(),
            solution: Some("public class Fibonacci {\n  public static void main(String[] args) {\n    int n = 10;\n    int first = 0, second = 1;\n    \n    System.out.print(first + \", \" + second);\n    \n    for (int i = 2; i < n; i++) {\n      int next = first + second;\n      System.out.print(\", \" + next);\n      first = second;\n      second = next;\n    }\n  }\n}".to_string()),
            created_at: timestamp("2023-01-05T00:00:00Z"),
        },
    ]
    .into_iter()
    .map(Problem::normalized)
    .collect()
});
