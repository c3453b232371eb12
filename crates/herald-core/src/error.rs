//! Error types and result aliases for herald.
//!
//! This module defines the shared error types used across all herald
//! components. Errors are structured for programmatic handling and include
//! context for debugging.

/// The result type used throughout herald.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in herald operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the ID invalid.
        message: String,
    },

    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A path or object was not found (simple variant for storage).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A precondition for the operation was not met.
    #[error("precondition failed: {message}")]
    PreconditionFailed {
        /// Description of the failed precondition.
        message: String,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn storage_error_display() {
        let err = Error::storage("bucket unreachable");
        assert!(err.to_string().contains("storage error"));
        assert!(StdError::source(&err).is_none());
    }

    #[test]
    fn storage_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "object missing");
        let err = Error::storage_with_source("failed to read object", source);
        assert!(err.to_string().contains("failed to read object"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn precondition_error_display() {
        let err = Error::PreconditionFailed {
            message: "action already registered".into(),
        };
        assert!(err.to_string().contains("precondition failed"));
    }
}
