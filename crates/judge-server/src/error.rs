//! Error types for the judge server.
//!
//! Covers configuration loading, the problem store, and wraps engine errors
//! that surface through the HTTP layer.

use std::path::PathBuf;

use judge_engine::JudgeError;

/// A specialized `Result` type for judge server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur while serving judge requests.
///
/// Variants carry actionable suggestions where the operator can fix the cause.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your judge.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Problem Store Errors
    // ========================================================================
    /// The problem store could not be read.
    #[error("Problem store unavailable: '{path}': {message}\n\nSuggestion: Check the 'problemsFile' field in judge.json; built-in problems are served meanwhile")]
    ProblemStoreUnavailable {
        /// Path of the backing file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The problem store holds malformed data.
    #[error("Malformed problem data in '{path}': {message}\n\nSuggestion: The file must contain a JSON array of problems")]
    ProblemStoreCorrupted {
        /// Path of the backing file.
        path: PathBuf,
        /// Description of the malformation.
        message: String,
    },

    /// No problem has the requested identifier.
    #[error("Problem not found: {id}")]
    ProblemNotFound {
        /// The requested identifier.
        id: u64,
    },

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// Error raised by the judging engine.
    #[error(transparent)]
    Judge(#[from] JudgeError),

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ProblemStoreUnavailable` error.
    #[must_use]
    pub fn store_unavailable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProblemStoreUnavailable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ProblemStoreCorrupted` error.
    #[must_use]
    pub fn store_corrupted(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProblemStoreCorrupted {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error comes from the problem store.
    ///
    /// Store errors are masked by the static fallback data.
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::ProblemStoreUnavailable { .. } | Self::ProblemStoreCorrupted { .. }
        )
    }

    /// Returns `true` if this error is fatal at startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. } | Self::ConfigValidationError { .. }
        )
    }
}
