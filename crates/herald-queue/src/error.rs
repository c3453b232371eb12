//! Error types for the persistence queue.

/// The result type used throughout herald-queue.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in queue and commit-store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing store rejected the commit because another writer got
    /// there first. The queue never retries these; callers may resubmit.
    #[error("commit conflict: {message}")]
    CommitConflict {
        /// Description of the conflict.
        message: String,
    },

    /// The backing store write itself failed (disk, network).
    #[error("commit I/O error: {message}")]
    CommitIo {
        /// Description of the failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization error occurred while encoding a commit record.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An error from herald-core.
    #[error("core error: {0}")]
    Core(#[from] herald_core::Error),
}

impl Error {
    /// Creates a new commit conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::CommitConflict {
            message: message.into(),
        }
    }

    /// Creates a new commit I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::CommitIo {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new commit I/O error with a source cause.
    #[must_use]
    pub fn io_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CommitIo {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this is a concurrent-modification conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::CommitConflict { .. })
    }

    /// Stable label for metrics and logs.
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::CommitConflict { .. } => "conflict",
            Self::CommitIo { .. } => "io",
            Self::Serialization { .. } => "serialization",
            Self::Core(_) => "core",
        }
    }
}
