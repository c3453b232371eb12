//! Strongly-typed identifiers for herald entities.
//!
//! Two kinds of identifier exist in this system:
//!
//! - **Gateway-assigned**: `ActionId` is minted by the external chat gateway
//!   and arrives with the inbound action. It is opaque to us; we validate and
//!   wrap it, never generate it.
//! - **Locally generated**: `CommitId` identifies one committed batch in the
//!   backing store. ULIDs encode creation time and sort naturally.
//!
//! # Example
//!
//! ```rust
//! use herald_core::id::{ActionId, CommitId};
//!
//! let action: ActionId = "1213949818443396177".parse().unwrap();
//! let commit = CommitId::generate();
//!
//! // IDs are different types - this won't compile:
//! // let wrong: ActionId = commit;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

use crate::error::{Error, Result};

/// The identifier of an inbound action, as assigned by the external gateway.
///
/// Unique per action. Opaque: the gateway decides the format, we only
/// require it to be non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Wraps a gateway-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidId` if the identifier is empty or contains
    /// whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidId {
                message: "action ID must not be empty".into(),
            });
        }
        if id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidId {
                message: format!("action ID '{id}' must not contain whitespace"),
            });
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A unique identifier for one committed batch in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(Ulid);

impl CommitId {
    /// Generates a new unique commit ID.
    ///
    /// Uses ULID generation which is:
    /// - Lexicographically sortable by creation time
    /// - Globally unique without coordination
    /// - URL-safe and case-insensitive
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Creates a commit ID from a raw ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }

    /// Returns the creation timestamp encoded in the ID.
    #[must_use]
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        let ms = self.0.timestamp_ms();
        chrono::DateTime::from_timestamp_millis(ms as i64).unwrap_or_else(chrono::Utc::now)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommitId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|e| Error::InvalidId {
                message: format!("invalid commit ID '{s}': {e}"),
            })
    }
}
