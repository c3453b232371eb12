//! Observability metrics for the persistence queue.
//!
//! Metrics are emitted through the `metrics` crate facade; the host process
//! decides the exporter (e.g. `metrics-exporter-prometheus`).
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `herald_queue_submissions_total` | Counter | - | Items submitted |
//! | `herald_queue_commits_total` | Counter | `result` | Batch commits by result |
//! | `herald_queue_batch_items` | Histogram | - | Items per committed batch |
//! | `herald_queue_depth` | Gauge | - | Items currently buffered |

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: Items submitted to the queue.
    pub const SUBMISSIONS_TOTAL: &str = "herald_queue_submissions_total";
    /// Counter: Batch commit attempts by result.
    pub const COMMITS_TOTAL: &str = "herald_queue_commits_total";
    /// Histogram: Number of items per batch at commit time.
    pub const BATCH_ITEMS: &str = "herald_queue_batch_items";
    /// Gauge: Items currently buffered.
    pub const QUEUE_DEPTH: &str = "herald_queue_depth";
}

/// Label keys used across metrics.
pub mod labels {
    /// Commit result (success, conflict, io, staging).
    pub const RESULT: &str = "result";
}
