//! Domain-level error taxonomy for go-actions.

use std::path::PathBuf;

/// go-actions core errors.
///
/// Configuration problems found while validating a project are never
/// reported through this type; they are collected as
/// [`ValidationError`](super::validation::ValidationError) records. This
/// enum covers failures of the inspection machinery itself.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid workflow glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("required input '{0}' is not set")]
    MissingInput(String),

    #[error("unknown job kind: {0}")]
    UnknownJobKind(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for go-actions core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = CoreError::NotFound(PathBuf::from("go.mod"));
        assert!(err.to_string().contains("file not found"));
        assert!(err.to_string().contains("go.mod"));
    }

    #[test]
    fn test_invalid_pattern_display() {
        let err = CoreError::InvalidPattern {
            pattern: "[".to_string(),
            reason: "unclosed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'['"));
        assert!(msg.contains("unclosed"));
    }
}
