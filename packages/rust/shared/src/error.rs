//! Error types for Sceneweaver.
//!
//! Library crates use [`SceneweaverError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Sceneweaver operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneweaverError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// No analysis capability is configured (missing API key).
    #[error("analysis unavailable: no API key configured")]
    AnalysisUnavailable,

    /// A single analysis attempt failed: unreachable service, non-success
    /// status, or a body that could not be parsed into the requested shape.
    /// The message distinguishes the cases for logging only.
    #[error("analysis error [{model}]: {message}")]
    Analysis { model: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SceneweaverError>;

impl SceneweaverError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an analysis error tagged with the model id that failed.
    pub fn analysis(model: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Analysis {
            model: model.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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
        let err = SceneweaverError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = SceneweaverError::analysis("gemini-2.5-flash", "HTTP 503");
        assert_eq!(
            err.to_string(),
            "analysis error [gemini-2.5-flash]: HTTP 503"
        );

        let err = SceneweaverError::AnalysisUnavailable;
        assert!(err.to_string().contains("no API key"));
    }
}
