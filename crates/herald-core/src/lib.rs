//! # herald-core
//!
//! Core abstractions for the herald bot response/persistence core.
//!
//! This crate provides the foundational types and traits used across all
//! herald components:
//!
//! - **Identifiers**: Strongly-typed IDs for actions and commits
//! - **Clock**: The time source abstraction behind every deadline decision
//! - **Storage**: The versioned, conditional-write backing store contract
//! - **Error Types**: Shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `herald-core` is the **only** crate allowed to define shared primitives.
//! The response controller and the persistence queue depend on it and on
//! nothing else of each other.
//!
//! ## Example
//!
//! ```rust
//! use herald_core::prelude::*;
//!
//! let action: ActionId = "1213949818443396177".parse().unwrap();
//! let commit = CommitId::generate();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod error;
pub mod id;
pub mod observability;
pub mod storage;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use herald_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::error::{Error, Result};
    pub use crate::id::{ActionId, CommitId};
    pub use crate::storage::{
        MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult,
    };
}

// Re-export key types at crate root for ergonomics
pub use clock::{Clock, SystemClock};
pub use error::{Error, Result};
pub use id::{ActionId, CommitId};
pub use observability::{LogFormat, init_logging};
pub use storage::{MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult};
