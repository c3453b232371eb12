//! Observability infrastructure for herald.
//!
//! Structured logging with consistent spans. This module provides
//! initialization helpers and span constructors used across both core
//! components.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `herald_queue=debug`)
///
/// # Example
///
/// ```rust
/// use herald_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for response-controller operations with standard fields.
///
/// # Example
///
/// ```rust
/// use herald_core::observability::responder_span;
///
/// let span = responder_span("acknowledge", "1213949818443396177");
/// let _guard = span.enter();
/// // ... respond to the action
/// ```
#[must_use]
pub fn responder_span(operation: &str, action_id: &str) -> Span {
    tracing::info_span!(
        "responder",
        op = operation,
        action_id = action_id,
    )
}

/// Creates a span for persistence-queue operations.
///
/// # Example
///
/// ```rust
/// use herald_core::observability::queue_span;
///
/// let span = queue_span("drain", 3);
/// let _guard = span.enter();
/// // ... drain the buffer
/// ```
#[must_use]
pub fn queue_span(operation: &str, depth: usize) -> Span {
    tracing::info_span!(
        "queue",
        op = operation,
        depth = depth,
    )
}
