//! Error types for Codevault domain operations.
//!
//! Everything in this crate that can fail returns `Result<T, BackupError>`.
//! The fetch and upload stages have their own error types in the crates
//! that own them; this enum covers input parsing and validation.
//!
//! # Example
//!
//! ```
//! use codevault_core::{BackupError, Result};
//!
//! fn commit(raw: &str) -> Result<&str> {
//!     if raw.is_empty() {
//!         return Err(BackupError::invalid_field("commitId", "cannot be empty"));
//!     }
//!     Ok(raw)
//! }
//!
//! assert!(commit("").unwrap_err().is_validation_error());
//! ```

use thiserror::Error;

/// Main error type for Codevault domain operations.
#[derive(Debug, Error)]
pub enum BackupError {
    /// A required input was not supplied.
    #[error("Missing required input '{name}'")]
    MissingInput {
        /// Name of the missing input (environment variable or JSON field)
        name: String,
    },

    /// An input was supplied but is not acceptable.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        /// Field that failed validation
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// A trigger event could not be decoded.
    #[error("Failed to parse trigger event: {message}")]
    EventParse {
        /// Description of the decode failure
        message: String,
        /// Underlying error, if any
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An artifact name did not follow `{commit}_{timestamp}.zip`.
    #[error("Malformed artifact name '{0}'")]
    MalformedArtifactName(String),
}

impl BackupError {
    /// Creates a MissingInput error.
    pub fn missing_input(name: impl Into<String>) -> Self {
        Self::MissingInput { name: name.into() }
    }

    /// Creates an InvalidField error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an EventParse error without a cause.
    pub fn event_parse(message: impl Into<String>) -> Self {
        Self::EventParse {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates an EventParse error with a cause.
    pub fn event_parse_with_cause<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::EventParse {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Returns true if the error rejects a supplied or missing input.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::MissingInput { .. } | Self::InvalidField { .. })
    }

    /// Returns true if the error comes from decoding a trigger event.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::EventParse { .. })
    }
}

/// Type alias for Results with BackupError.
pub type Result<T> = std::result::Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_display() {
        let error = BackupError::missing_input("COMMIT_ID");
        assert_eq!(error.to_string(), "Missing required input 'COMMIT_ID'");
        assert!(error.is_validation_error());
    }

    #[test]
    fn test_invalid_field_display() {
        let error = BackupError::invalid_field("referenceName", "cannot contain '..'");
        let msg = error.to_string();

        assert!(msg.contains("referenceName"));
        assert!(msg.contains(".."));
    }

    #[test]
    fn test_event_parse_keeps_cause() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = BackupError::event_parse_with_cause("truncated payload", cause);

        use std::error::Error;
        assert!(error.source().is_some());
        assert!(error.is_parse_error());
        assert!(!error.is_validation_error());
    }

    #[test]
    fn test_result_with_question_mark() {
        fn inner() -> Result<()> {
            Err(BackupError::MalformedArtifactName("x".into()))
        }

        fn outer() -> Result<String> {
            inner()?;
            Ok("unreachable".into())
        }

        assert!(outer().is_err());
    }
}
