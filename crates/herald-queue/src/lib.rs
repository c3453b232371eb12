//! # herald-queue
//!
//! Write-coalescing persistence queue for the herald bot core.
//!
//! The durable backing store is versioned, supports one writer at a time,
//! and charges a full commit per write. This crate turns arbitrarily many
//! small mutation requests into few large writes:
//!
//! - **Non-blocking submission**: `submit` returns an outcome handle
//!   immediately; callers await their own request's fate, nothing else
//! - **Single-drain discipline**: at most one commit is ever in flight
//! - **Coalescing**: batches are bounded by size and item age, and drains
//!   pause between batches so bursts land together
//! - **Atomic batches**: every outcome in a batch resolves the same way,
//!   exactly once, in submission order
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use herald_core::{MemoryBackend, SystemClock};
//! use herald_queue::{CommitQueue, QueueConfig, SnapshotStore};
//!
//! # async fn demo() -> herald_core::Result<()> {
//! let store = Arc::new(SnapshotStore::new(Arc::new(MemoryBackend::new())));
//! let queue = CommitQueue::new(store, Arc::new(SystemClock), QueueConfig::default())?;
//!
//! let outcome = queue.submit(
//!     "scoreboard",
//!     Bytes::from(r#"{"wins": 3}"#),
//!     "scoreboard update",
//! );
//! let committed = outcome.resolved().await;
//! # let _ = committed;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::QueueConfig;
    pub use crate::error::{Error, Result};
    pub use crate::queue::{CommitQueue, OutcomeHandle, QueueStatus};
    pub use crate::store::{CommitRecord, CommitStore, SnapshotStore};
}

pub use config::QueueConfig;
pub use error::{Error, Result};
pub use queue::{CommitQueue, OutcomeHandle, QueueStatus};
pub use store::{CommitRecord, CommitStore, SnapshotStore};
