//! Observability metrics for the response controller.
//!
//! Metrics are emitted through the `metrics` crate facade; the host process
//! decides the exporter (e.g. `metrics-exporter-prometheus`).
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `herald_responder_acks_total` | Counter | `mode` | Acknowledgments by tier (direct/deferred) |
//! | `herald_responder_actions_total` | Counter | `state` | Terminal action outcomes |
//! | `herald_responder_updates_total` | Counter | `result` | Update deliveries by result |
//! | `herald_responder_gateway_errors_total` | Counter | `class` | Gateway errors by class |
//! | `herald_responder_background_failures_total` | Counter | - | Failed background operations |

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: Acknowledgments by tier.
    pub const ACKS_TOTAL: &str = "herald_responder_acks_total";
    /// Counter: Terminal action outcomes by state.
    pub const ACTIONS_TOTAL: &str = "herald_responder_actions_total";
    /// Counter: Update deliveries by result.
    pub const UPDATES_TOTAL: &str = "herald_responder_updates_total";
    /// Counter: Gateway errors by class.
    pub const GATEWAY_ERRORS_TOTAL: &str = "herald_responder_gateway_errors_total";
    /// Counter: Background operations that failed inside their boundary.
    pub const BACKGROUND_FAILURES_TOTAL: &str = "herald_responder_background_failures_total";
}

/// Label keys used across metrics.
pub mod labels {
    /// Acknowledgment tier (direct, deferred).
    pub const MODE: &str = "mode";
    /// Terminal state (completed, expired, failed).
    pub const STATE: &str = "state";
    /// Delivery result (success, failure, silent).
    pub const RESULT: &str = "result";
    /// Gateway error class.
    pub const CLASS: &str = "class";
}
