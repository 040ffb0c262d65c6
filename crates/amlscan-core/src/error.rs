//! Error types for AMLScan.

use thiserror::Error;

/// Result type alias using `AnalyzerError`.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur during an analysis run.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The transaction batch failed validation before analysis started.
    #[error("Input validation failed: {0}")]
    InputValidation(String),

    /// A single detector failed on otherwise valid input.
    ///
    /// Caught at the suite boundary; the run continues without this
    /// detector's findings.
    #[error("Detector '{detector}' failed: {message}")]
    Detector {
        /// Detector identifier (e.g. "patterns/structuring").
        detector: String,
        /// Failure description.
        message: String,
    },

    /// An expensive detector would exceed its configured size ceiling.
    #[error("Resource limit reached in '{detector}': {limit}")]
    ResourceLimit {
        /// Detector identifier.
        detector: String,
        /// Description of the exceeded limit.
        limit: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    /// Create an input validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        AnalyzerError::InputValidation(msg.into())
    }

    /// Create a detector error.
    #[must_use]
    pub fn detector(detector: impl Into<String>, msg: impl Into<String>) -> Self {
        AnalyzerError::Detector {
            detector: detector.into(),
            message: msg.into(),
        }
    }

    /// Create a resource limit error.
    #[must_use]
    pub fn resource_limit(detector: impl Into<String>, limit: impl Into<String>) -> Self {
        AnalyzerError::ResourceLimit {
            detector: detector.into(),
            limit: limit.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        AnalyzerError::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        AnalyzerError::Internal(msg.into())
    }

    /// Returns true if the suite can continue past this error.
    ///
    /// Detector and resource-limit errors are contained per detector;
    /// validation and configuration errors abort the run.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalyzerError::Detector { .. } | AnalyzerError::ResourceLimit { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_error_is_recoverable() {
        let err = AnalyzerError::detector("patterns/structuring", "degenerate input");
        assert!(err.is_recoverable());

        let err = AnalyzerError::resource_limit("patterns/layering", "graph too large");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_validation_error_is_fatal() {
        let err = AnalyzerError::validation("amount is NaN");
        assert!(!err.is_recoverable());

        let err = AnalyzerError::config("centrality_percentile out of range");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = AnalyzerError::detector("patterns/hub-account", "empty degree distribution");
        assert_eq!(
            err.to_string(),
            "Detector 'patterns/hub-account' failed: empty degree distribution"
        );
    }
}
