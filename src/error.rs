//! Error types for linkscout
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in linkscout
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Invalid configuration (missing API key, bad CLI argument)
    #[error("Config error: {0}")]
    Config(String),

    /// Projected spend would meet or exceed the cost ceiling
    #[error("Cost ceiling exceeded: projected ${projected:.4} >= ceiling ${ceiling:.4}")]
    CeilingExceeded { projected: f64, ceiling: f64 },

    /// The run's wall-time budget expired
    #[error("Wall time exceeded after {0} seconds")]
    WallTimeExceeded(u64),

    /// The user interrupted the run (Ctrl-C)
    #[error("Interrupted by user")]
    Interrupted,

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// The model returned text that did not decode as the expected JSON
    #[error("JSON parse failed: {reason} (preview: {preview})")]
    JsonParse { reason: String, preview: String },

    /// README fetch or list parsing failure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Artifact write failure (including write-once violations)
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScoutError {
    /// Ceiling and wall-time are soft: the pipeline stops issuing new work
    /// but still renders whatever has been committed.
    pub fn is_soft_termination(&self) -> bool {
        matches!(
            self,
            ScoutError::CeilingExceeded { .. } | ScoutError::WallTimeExceeded(_)
        )
    }
}

/// Result type alias for linkscout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ScoutError::Config("ANTHROPIC_API_KEY not set".to_string());
        assert_eq!(err.to_string(), "Config error: ANTHROPIC_API_KEY not set");
    }

    #[test]
    fn test_ceiling_error_display() {
        let err = ScoutError::CeilingExceeded {
            projected: 10.5,
            ceiling: 10.0,
        };
        assert!(err.to_string().contains("$10.5000"));
        assert!(err.to_string().contains("$10.0000"));
    }

    #[test]
    fn test_wall_time_error_display() {
        let err = ScoutError::WallTimeExceeded(600);
        assert_eq!(err.to_string(), "Wall time exceeded after 600 seconds");
    }

    #[test]
    fn test_soft_termination() {
        assert!(
            ScoutError::CeilingExceeded {
                projected: 1.0,
                ceiling: 1.0
            }
            .is_soft_termination()
        );
        assert!(ScoutError::WallTimeExceeded(1).is_soft_termination());
        assert!(!ScoutError::Llm("boom".to_string()).is_soft_termination());
        assert!(!ScoutError::Interrupted.is_soft_termination());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScoutError = io_err.into();
        assert!(matches!(err, ScoutError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ScoutError = json_err.into();
        assert!(matches!(err, ScoutError::Json(_)));
    }

    #[test]
    fn test_json_parse_error_carries_preview() {
        let err = ScoutError::JsonParse {
            reason: "expected value".to_string(),
            preview: "Sure! Here is".to_string(),
        };
        assert!(err.to_string().contains("Sure! Here is"));
    }
}
