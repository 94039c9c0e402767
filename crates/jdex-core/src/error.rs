//! Error types for the jdex engine.
//!
//! Every failure carries a human-readable message; `error_code` gives callers
//! (the CLI, the review surface) a stable machine-readable classification.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the jdex library.
#[derive(Debug, Error)]
pub enum JdexError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Taxonomy errors
    #[error("Taxonomy validation failed: {}", violations.join("; "))]
    Validation { violations: Vec<String> },

    #[error("Unknown taxonomy location: {area} / {category}")]
    UnknownCategory { area: String, category: String },

    // Library errors
    #[error("Duplicate document: content {hash} already filed at {existing}")]
    Duplicate { hash: String, existing: PathBuf },

    #[error("Text extraction failed for {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    // Categorization backend errors
    #[error("Backend {backend} failed: {message}")]
    Backend { backend: String, message: String },

    #[error("Backend {backend} is not available")]
    BackendUnavailable { backend: String },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {message}")]
    Network { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for jdex operations.
pub type Result<T> = std::result::Result<T, JdexError>;

impl From<std::io::Error> for JdexError {
    fn from(err: std::io::Error) -> Self {
        JdexError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for JdexError {
    fn from(err: serde_json::Error) -> Self {
        JdexError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for JdexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JdexError::Timeout(Duration::from_secs(0))
        } else {
            JdexError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl JdexError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        JdexError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a backend failure for the named backend.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        JdexError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// True for the routine "this content is already filed" outcome.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, JdexError::Duplicate { .. })
    }

    /// Stable short code for structured error reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            JdexError::Io { .. } | JdexError::NotADirectory(_) => "io",
            JdexError::FileNotFound(_) => "not_found",
            JdexError::Json { .. } => "json",
            JdexError::Validation { .. } | JdexError::UnknownCategory { .. } => "validation",
            JdexError::Duplicate { .. } => "duplicate",
            JdexError::Extraction { .. } => "extraction",
            JdexError::Backend { .. }
            | JdexError::BackendUnavailable { .. }
            | JdexError::Timeout(_)
            | JdexError::Network { .. } => "backend",
            JdexError::Config { .. } => "config",
            JdexError::InvalidParams { .. } => "invalid_params",
            JdexError::Other(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_every_violation() {
        let err = JdexError::Validation {
            violations: vec!["Too many areas: 10".into(), "Bad name".into()],
        };
        assert_eq!(
            err.to_string(),
            "Taxonomy validation failed: Too many areas: 10; Bad name"
        );
    }

    #[test]
    fn test_error_codes() {
        let dup = JdexError::Duplicate {
            hash: "abc".into(),
            existing: PathBuf::from("/lib/a.pdf"),
        };
        assert!(dup.is_duplicate());
        assert_eq!(dup.error_code(), "duplicate");
        assert_eq!(JdexError::Timeout(Duration::from_secs(5)).error_code(), "backend");
        assert_eq!(
            JdexError::FileNotFound(PathBuf::from("x")).error_code(),
            "not_found"
        );
    }

    #[test]
    fn test_io_with_path_keeps_path() {
        let err = JdexError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/file.pdf",
        );
        match err {
            JdexError::Io { path, .. } => assert_eq!(path, Some(PathBuf::from("/tmp/file.pdf"))),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
