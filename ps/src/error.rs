//! Store error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from plan and state storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Plan not found: {0}")]
    NotFound(String),

    #[error("Invalid plan id: '{0}'")]
    InvalidId(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error means the plan does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_includes_path() {
        let err = StoreError::io(
            "/tmp/plans/demo",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        let msg = err.to_string();
        assert!(msg.contains("/tmp/plans/demo"));
        assert!(msg.contains("denied"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::NotFound("demo".to_string());
        assert_eq!(err.to_string(), "Plan not found: demo");
        assert!(err.is_not_found());
    }
}
