//! Error types for advisor operations.
//!
//! The action mapper itself is total and never fails. These errors belong to
//! batch assembly, configuration and report I/O.

use thiserror::Error;

/// Result type for advisor operations.
pub type AdvisorResult<T> = Result<T, AdvisorError>;

/// Errors that can occur while assembling or persisting recommendations.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Invalid configuration parameter.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// The same element appears more than once in a batch.
    #[error("duplicate element id {element_id}")]
    DuplicateElement {
        /// The repeated element id.
        element_id: u64,
    },

    /// Input or report content could not be interpreted.
    #[error("invalid content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdvisorError {
    /// Create an `InvalidConfig` error with the given message.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AdvisorError::invalid_config("medium threshold above high");
        assert!(format!("{err}").contains("medium threshold above high"));

        let err = AdvisorError::DuplicateElement { element_id: 42 };
        assert_eq!(format!("{err}"), "duplicate element id 42");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "signals.json");
        let err: AdvisorError = io.into();
        assert!(matches!(err, AdvisorError::Io(_)));
        assert!(format!("{err}").contains("signals.json"));
    }
}
