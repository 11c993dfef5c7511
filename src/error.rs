// src/error.rs

//! Error types for the addon lifecycle engine
//!
//! Every pipeline stage wraps its cause into a message naming the stage;
//! rollback failures never replace the primary error.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the addon lifecycle engine
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed archive, invalid manifest, bad UUID, bad version
    #[error("validation failed: {0}")]
    Validation(String),

    /// Server directory does not conform to the Bedrock layout
    #[error("invalid server layout: {0}")]
    Layout(String),

    /// UUID already installed, pack not installed, ambiguous selector
    #[error("{0}")]
    Conflict(String),

    /// Missing or circular dependencies, incomplete dependency checks
    #[error("dependency error: {0}")]
    Dependency(String),

    /// Filesystem read/write/rename/delete failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be opened or decoded
    #[error("archive error: {0}")]
    Archive(String),

    /// JSON encode/decode failures
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An operation failed and the subsequent restore failed too.
    /// Both causes are preserved; the primary error stays first.
    #[error("{operation} failed: {source}; rollback also failed: {rollback}")]
    Rollback {
        operation: String,
        source: Box<Error>,
        rollback: Box<Error>,
    },

    /// Catch-all with preformatted context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an I/O error with path context, preserving the cause text.
    pub fn io_context(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Error::Other(format!("{}: {}", context, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_error_keeps_both_causes() {
        let primary = Error::Validation("bad manifest".to_string());
        let restore = Error::Conflict("config busy".to_string());
        let err = Error::Rollback {
            operation: "install".to_string(),
            source: Box::new(primary),
            rollback: Box::new(restore),
        };

        let text = err.to_string();
        assert!(text.contains("bad manifest"));
        assert!(text.contains("config busy"));
        assert!(text.starts_with("install failed"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
