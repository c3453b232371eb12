//! # herald-responder
//!
//! Deadline-bounded response controller for the herald bot core.
//!
//! Every inbound action arrives with a hard window (about three seconds)
//! for its first acknowledgment; miss it and the response channel is gone
//! for good. This crate owns that race:
//!
//! - **Tiered degradation**: Direct reply when there is time, placeholder
//!   deferral when there is not, nothing at all once the window (minus a
//!   safety margin) has closed
//! - **At most one acknowledgment**: Claimed under a single lock before any
//!   outbound call is made
//! - **Budgeted execution**: `run_with_budget` races business logic against
//!   a timeout shorter than the window and pushes slow work into a
//!   background task with its own error boundary
//!
//! ## Guarantees
//!
//! - Exactly one terminal transition per action
//! - Zero or one outbound acknowledgment attempts per action
//! - No internal error escapes: callers see booleans, failures are logged
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use herald_core::SystemClock;
//! use herald_responder::{
//!     ActionKind, BudgetOptions, ReplyContent, ResponderConfig, ResponseController,
//! };
//! # use herald_responder::gateway::ResponseGateway;
//! # async fn demo(gateway: Arc<dyn ResponseGateway>) -> herald_core::Result<()> {
//! let controller = Arc::new(ResponseController::new(
//!     gateway,
//!     Arc::new(SystemClock),
//!     ResponderConfig::default(),
//! )?);
//!
//! let id: herald_core::ActionId = "1213949818443396177".parse()?;
//! controller.register(id.clone(), ActionKind::Command)?;
//!
//! let handled = controller
//!     .run_with_budget(
//!         &id,
//!         BudgetOptions::default(),
//!         async { Ok(ReplyContent::text("request approved")) },
//!         None::<std::future::Ready<Result<(), herald_responder::BoxError>>>,
//!     )
//!     .await;
//! assert!(handled || controller.snapshot(&id).is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod config;
pub mod content;
pub mod controller;
pub mod gateway;
pub mod metrics;
mod registry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::action::{ActionKind, ActionState, PendingAction};
    pub use crate::config::ResponderConfig;
    pub use crate::content::{ReplyContent, ReplyOptions};
    pub use crate::controller::{BoxError, BudgetOptions, ResponseController};
    pub use crate::gateway::{GatewayError, GatewayResult, ResponseGateway};
    pub use crate::registry::ResponderStats;
}

pub use action::{ActionKind, ActionState, PendingAction};
pub use config::ResponderConfig;
pub use content::{ReplyContent, ReplyOptions};
pub use controller::{BoxError, BudgetOptions, ResponseController};
pub use gateway::{GatewayError, GatewayResult, ResponseGateway};
pub use registry::ResponderStats;
