//! Error types for the judging engine.
//!
//! Structural problems with submitted source are not errors: they are
//! reported as a [`Diagnostic`](crate::Diagnostic) inside a failed
//! [`Verdict`](crate::Verdict). The variants here cover input that never
//! reaches the core and misuse of the engine's own machinery.

/// A specialized `Result` type for judging engine operations.
pub type Result<T> = std::result::Result<T, JudgeError>;

/// Errors that can occur around a judging invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JudgeError {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// The submission carried no source text.
    #[error("No code provided")]
    EmptySource,

    // ========================================================================
    // Capacity Errors
    // ========================================================================
    /// The judge pool is saturated and configured to reject overflow.
    #[error("Judge is busy: {limit} submissions already running\n\nSuggestion: Retry shortly or raise maxConcurrent")]
    Busy {
        /// Maximum number of concurrently running sessions.
        limit: usize,
    },

    /// The judge pool was shut down while a submission waited for a slot.
    #[error("Judge pool is closed")]
    PoolClosed,

    // ========================================================================
    // State Machine Errors
    // ========================================================================
    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },
}

impl JudgeError {
    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns `true` if the caller supplied bad input.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptySource)
    }

    /// Returns `true` if this error is transient and the request may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}
