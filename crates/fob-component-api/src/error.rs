//! Error types and failure records.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::RuntimeError;

/// Result type alias for operations that can abort a file's analysis.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that abort the analysis of a whole file.
///
/// Parse problems never appear here; they are reported as [`ParseFailure`]
/// values inside the extraction results.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The source file could not be read through the runtime.
    #[error("failed to read component '{path}': {source}")]
    Runtime {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying runtime error.
        #[source]
        source: RuntimeError,
    },

    /// Extraction did not finish before the configured deadline.
    #[error("analysis of '{path}' timed out after {elapsed:?}")]
    Timeout {
        /// Path of the component being analyzed.
        path: PathBuf,
        /// Deadline that expired.
        elapsed: Duration,
    },

    /// The blocking extraction task failed to join.
    #[error("extraction task for '{path}' failed: {message}")]
    Task {
        /// Path of the component being analyzed.
        path: PathBuf,
        /// Join error message.
        message: String,
    },

    /// Output could not be serialized.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ApiError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}

/// Classification of a non-fatal extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The structural parse failed.
    Syntax,
    /// A well-formed declaration could not be classified.
    Type,
    /// A module specifier could not be resolved to a file.
    Import,
    /// Anything without a better classification.
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Syntax => "syntax",
            Self::Type => "type",
            Self::Import => "import",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A failure recorded as data instead of being propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    /// File (or virtual path) the failure belongs to.
    pub file: String,
    /// Human-readable failure message.
    pub message: String,
    /// Failure classification.
    pub kind: FailureKind,
}

impl ParseFailure {
    /// Creates a failure of the given kind.
    pub fn new(file: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
            kind,
        }
    }

    /// Helper to create a syntax failure from multiple diagnostic strings.
    pub fn syntax(file: impl Into<String>, diagnostics: &[String]) -> Self {
        Self::new(file, FailureKind::Syntax, diagnostics.join("; "))
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error in '{}': {}", self.kind, self.file, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_failure_joins_diagnostics() {
        let failure = ParseFailure::syntax(
            "Button.svelte",
            &["Unexpected token".to_string(), "Expected `}`".to_string()],
        );
        assert_eq!(failure.kind, FailureKind::Syntax);
        assert_eq!(failure.message, "Unexpected token; Expected `}`");
        assert_eq!(
            failure.to_string(),
            "syntax error in 'Button.svelte': Unexpected token; Expected `}`"
        );
    }

    #[test]
    fn failure_kind_serializes_lowercase() {
        let json = serde_json::to_string(&FailureKind::Import).unwrap();
        assert_eq!(json, "\"import\"");
    }
}
