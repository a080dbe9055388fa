//! Configuration for the judge server.
//!
//! Settings live in `judge.json`. Every field is optional; a missing file
//! yields the defaults.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use judge_engine::{EmptyFixturePolicy, JudgeOptions, OverflowPolicy, DEFAULT_MAX_CONCURRENT};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::problems::{FallbackProblemStore, FileProblemStore, ProblemStore, StaticProblemStore};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "judge.json";

/// Default artificial delay before validation, in milliseconds.
const fn default_execution_delay_ms() -> u64 {
    1000
}

/// Default cap on concurrently running sessions.
const fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

/// Default per-subscriber event buffer.
const fn default_event_capacity() -> usize {
    100
}

/// Judge server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Artificial delay awaited before validation, in milliseconds.
    #[serde(default = "default_execution_delay_ms")]
    pub execution_delay_ms: u64,

    /// Wall-clock budget per session in milliseconds. Unset disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Maximum number of sessions running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// What to do with submissions beyond `max_concurrent`.
    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// How problems without fixtures are graded.
    #[serde(default)]
    pub empty_fixture_policy: EmptyFixturePolicy,

    /// JSON file holding the problem set. Unset serves the built-in problems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems_file: Option<String>,

    /// Events buffered per WebSocket subscriber before old ones are dropped.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            execution_delay_ms: default_execution_delay_ms(),
            timeout_ms: None,
            max_concurrent: default_max_concurrent(),
            overflow: OverflowPolicy::default(),
            empty_fixture_policy: EmptyFixturePolicy::default(),
            problems_file: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `judge.json` in the current directory; falls back to defaults
    /// when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            ServerError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `judge.json` in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ConfigParseError` if the file cannot be read or
    /// holds invalid JSON or enum values.
    ///
    /// Returns `ServerError::ConfigValidationError` if a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(ServerError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ServerError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `timeout_ms`, when set, must be greater than 0
    /// - `max_concurrent` must be greater than 0
    /// - `event_capacity` must be greater than 0
    /// - `problems_file`, when set, must not be empty
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == Some(0) {
            return Err(ServerError::config_validation(
                "timeoutMs must be greater than 0",
                "Remove timeoutMs to disable the timeout, or set it to at least 1 in your judge.json",
            ));
        }

        if self.max_concurrent == 0 {
            return Err(ServerError::config_validation(
                "maxConcurrent must be greater than 0",
                "Set maxConcurrent to at least 1 in your judge.json",
            ));
        }

        if self.event_capacity == 0 {
            return Err(ServerError::config_validation(
                "eventCapacity must be greater than 0",
                "Set eventCapacity to at least 1 in your judge.json",
            ));
        }

        if self
            .problems_file
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(ServerError::config_validation(
                "problemsFile must not be empty",
                "Provide a path to a problems JSON file, or remove problemsFile to use the built-in problems",
            ));
        }

        Ok(())
    }

    /// The execution delay as a `Duration`.
    #[must_use]
    pub const fn execution_delay(&self) -> Duration {
        Duration::from_millis(self.execution_delay_ms)
    }

    /// The session timeout as a `Duration`, if set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Engine options derived from this configuration.
    #[must_use]
    pub fn judge_options(&self) -> JudgeOptions {
        JudgeOptions {
            execution_delay: self.execution_delay(),
            timeout: self.timeout(),
        }
    }

    /// The problem source this configuration selects.
    ///
    /// `problems_file` is served behind the static fallback; without one the
    /// built-in set is used.
    #[must_use]
    pub fn problem_store(&self) -> Arc<dyn ProblemStore> {
        match self.problems_file.as_deref() {
            Some(path) => Arc::new(FallbackProblemStore::new(Box::new(FileProblemStore::new(
                path,
            )))),
            None => Arc::new(StaticProblemStore),
        }
    }
}
