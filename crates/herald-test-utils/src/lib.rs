//! Shared test utilities for herald integration tests.
//!
//! This crate provides:
//! - [`SimulatedClock`]: Manually advanced time for threshold tests
//! - [`ScriptedGateway`]: Records outbound calls, injects classified failures
//! - [`RecordingCommitStore`]: Records commits, injects conflicts/IO errors,
//!   tracks the in-flight high-water mark
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_test_utils::{ScriptedGateway, SimulatedClock};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let clock = SimulatedClock::shared();
//!     let gateway = ScriptedGateway::new(clock.clone());
//!     // ... drive the controller ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod clock;
pub mod gateway;
pub mod storage;

pub use clock::*;
pub use gateway::*;
pub use storage::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("herald=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
