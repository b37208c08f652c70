//! Error types for testsplit.
//!
//! Library crates use [`TestSplitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all testsplit operations.
#[derive(Debug, thiserror::Error)]
pub enum TestSplitError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Feature file syntax error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A cost could not be estimated for an artifact.
    #[error("cost unavailable for {path:?}: {message}")]
    Estimation { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid grouping input (group count, costs, options).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TestSplitError>;

impl TestSplitError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Attach an artifact path to an estimation failure.
    pub fn estimation(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Estimation {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TestSplitError::config("bad ignore_tag_pattern");
        assert_eq!(err.to_string(), "config error: bad ignore_tag_pattern");

        let err = TestSplitError::validation("num_groups must be at least 1");
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn estimation_error_names_the_path() {
        let err = TestSplitError::estimation("features/login.feature", "line 3: step outside scenario");
        let msg = err.to_string();
        assert!(msg.starts_with("cost unavailable"));
        assert!(msg.contains("login.feature"));
        assert!(msg.contains("line 3"));
    }
}
