//! The write-coalescing commit queue.
//!
//! The backing store supports one writer at a time and its write is
//! expensive (a durable, versioned commit), so many small mutation requests
//! must become few large writes - without losing any caller's ability to
//! learn the outcome of *their* request.
//!
//! Discipline:
//!
//! - Submission appends to an in-memory buffer and returns an outcome
//!   handle immediately; it never blocks behind a drain.
//! - At most one drain runs at a time. The drain flag lives under the same
//!   mutex as the buffer, so drains cannot race.
//! - A drain consumes the buffer front into a batch (bounded by size and
//!   item age), stages every record, then makes one commit call for the
//!   whole batch. The batch is atomic: all outcomes resolve `true` on
//!   success and all resolve `false` on any failure.
//! - A non-empty buffer after a drain schedules the next drain after a
//!   short pause, so bursts keep coalescing instead of committing one by
//!   one.
//! - Conflicts are not retried here; resubmission is the caller's call.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use tokio::sync::oneshot;
use tracing::Instrument;

use herald_core::Clock;

use crate::config::QueueConfig;
use crate::metrics::{labels, names};
use crate::store::CommitStore;

/// The outcome handle returned to a submitter.
///
/// Resolves exactly once: `true` if the batch containing the submission
/// committed, `false` if it failed or the queue shut down before draining
/// it.
#[derive(Debug)]
pub struct OutcomeHandle {
    receiver: oneshot::Receiver<bool>,
}

impl OutcomeHandle {
    /// Waits for the submission's batch to commit or fail.
    pub async fn resolved(self) -> bool {
        // A dropped sender means the queue was torn down with the item
        // still buffered; that is a failure from the caller's view.
        self.receiver.await.unwrap_or(false)
    }
}

/// Read-only queue health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// Items currently buffered.
    pub depth: usize,
    /// Age of the oldest buffered item, if any.
    pub oldest_age: Option<Duration>,
    /// Whether a drain is currently active.
    pub draining: bool,
}

/// One buffered mutation request.
struct CommitItem {
    target: String,
    payload: Bytes,
    label: String,
    submitted_at: DateTime<Utc>,
    outcome: oneshot::Sender<bool>,
}

#[derive(Default)]
struct QueueState {
    buffer: VecDeque<CommitItem>,
    draining: bool,
}

struct Shared {
    store: Arc<dyn CommitStore>,
    clock: Arc<dyn Clock>,
    config: QueueConfig,
    state: Mutex<QueueState>,
}

/// Write-coalescing queue over a [`CommitStore`].
///
/// One instance per process, shared by the business layer via `Arc` (or by
/// cloning; clones share the same buffer).
#[derive(Clone)]
pub struct CommitQueue {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for CommitQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("CommitQueue")
            .field("depth", &status.depth)
            .field("draining", &status.draining)
            .finish_non_exhaustive()
    }
}

impl CommitQueue {
    /// Creates a queue over the given store and clock.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the configuration is inconsistent.
    pub fn new(
        store: Arc<dyn CommitStore>,
        clock: Arc<dyn Clock>,
        config: QueueConfig,
    ) -> herald_core::Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                store,
                clock,
                config,
                state: Mutex::new(QueueState::default()),
            }),
        })
    }

    /// Submits one mutation request.
    ///
    /// Returns immediately with the handle that resolves once the request's
    /// batch commits or fails. Triggers a drain if none is active.
    #[tracing::instrument(skip_all)]
    pub fn submit(
        &self,
        target: impl Into<String>,
        payload: Bytes,
        label: impl Into<String>,
    ) -> OutcomeHandle {
        let (sender, receiver) = oneshot::channel();
        let item = CommitItem {
            target: target.into(),
            payload,
            label: label.into(),
            submitted_at: self.shared.clock.now(),
            outcome: sender,
        };

        let start_drain = {
            let mut state = self.shared.lock();
            state.buffer.push_back(item);
            counter!(names::SUBMISSIONS_TOTAL).increment(1);
            gauge!(names::QUEUE_DEPTH).set(state.buffer.len() as f64);
            if state.draining {
                false
            } else {
                state.draining = true;
                true
            }
        };

        if start_drain {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(run_drain(shared));
        }

        OutcomeHandle { receiver }
    }

    /// Returns the current queue health, for external reporting only.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        let now = self.shared.clock.now();
        let state = self.shared.lock();
        QueueStatus {
            depth: state.buffer.len(),
            oldest_age: state
                .buffer
                .front()
                .map(|item| (now - item.submitted_at).to_std().unwrap_or(Duration::ZERO)),
            draining: state.draining,
        }
    }
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        // The buffer is plain data; a panic while holding the lock leaves
        // nothing to repair.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Consumes the buffer front into the next batch.
    ///
    /// Stops at the size cap, at an empty buffer, or when the oldest
    /// remaining item is over the age bound - the last case flushes the
    /// batch as-is so that no item waits behind further coalescing.
    fn take_batch(&self) -> Vec<CommitItem> {
        let now = self.clock.now();
        let mut state = self.lock();
        let mut batch = Vec::new();

        while batch.len() < self.config.max_batch_size {
            let Some(item) = state.buffer.pop_front() else {
                break;
            };
            batch.push(item);

            if let Some(next) = state.buffer.front() {
                let age = (now - next.submitted_at).to_std().unwrap_or(Duration::ZERO);
                if age > self.config.max_item_age {
                    break;
                }
            }
        }

        gauge!(names::QUEUE_DEPTH).set(state.buffer.len() as f64);
        batch
    }

    /// Stages and commits one batch, resolving every outcome exactly once.
    async fn flush(&self, batch: Vec<CommitItem>) {
        let span = herald_core::observability::queue_span("flush", batch.len());
        self.flush_inner(batch).instrument(span).await;
    }

    async fn flush_inner(&self, batch: Vec<CommitItem>) {
        // Stage every record first. Any staging failure fails the whole
        // batch - outcomes are atomic, never partial.
        for item in &batch {
            if let Err(err) = self.store.stage(&item.target, item.payload.clone()).await {
                tracing::error!(record = %item.target, error = %err, "staging failed, failing batch");
                counter!(names::COMMITS_TOTAL, labels::RESULT => "staging").increment(1);
                resolve_all(batch, false);
                return;
            }
        }

        let targets = distinct_targets(&batch);
        let label = batch_label(&batch, &targets);

        match self.store.commit(&targets, &label).await {
            Ok(commit_id) => {
                tracing::info!(
                    %commit_id,
                    items = batch.len(),
                    targets = targets.len(),
                    "batch committed"
                );
                counter!(names::COMMITS_TOTAL, labels::RESULT => "success").increment(1);
                histogram!(names::BATCH_ITEMS).record(batch.len() as f64);
                resolve_all(batch, true);
            }
            Err(err) if err.is_conflict() => {
                // No retry against a contended store; the callers decide
                // whether the write is still worth making.
                tracing::warn!(error = %err, "commit conflict, failing batch");
                counter!(names::COMMITS_TOTAL, labels::RESULT => "conflict").increment(1);
                resolve_all(batch, false);
            }
            Err(err) => {
                tracing::error!(error = %err, "commit failed, failing batch");
                counter!(names::COMMITS_TOTAL, labels::RESULT => "io").increment(1);
                resolve_all(batch, false);
            }
        }
    }
}

/// Drives drains until the buffer is empty.
///
/// The spawning submit set `draining` under the lock, so exactly one of
/// these tasks exists at a time. Between batches the task pauses for the
/// re-drain delay, letting submissions that arrive mid-drain coalesce
/// instead of committing one at a time.
async fn run_drain(shared: Arc<Shared>) {
    loop {
        let batch = shared.take_batch();
        if !batch.is_empty() {
            shared.flush(batch).await;
        }

        let keep_draining = {
            let mut state = shared.lock();
            if state.buffer.is_empty() {
                state.draining = false;
                false
            } else {
                true
            }
        };
        if !keep_draining {
            return;
        }

        tokio::time::sleep(shared.config.redrain_delay).await;
    }
}

/// Resolves every outcome in submission order.
fn resolve_all(batch: Vec<CommitItem>, success: bool) {
    for item in batch {
        // The receiver may have been dropped; that is the submitter's
        // choice, not an error.
        let _ = item.outcome.send(success);
    }
}

/// The distinct targets of a batch, in first-submission order.
fn distinct_targets(batch: &[CommitItem]) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for item in batch {
        if !targets.contains(&item.target) {
            targets.push(item.target.clone());
        }
    }
    targets
}

/// A single item keeps its own label; a batch gets a summary naming each
/// distinct target once.
fn batch_label(batch: &[CommitItem], targets: &[String]) -> String {
    match batch {
        [only] => only.label.clone(),
        _ => format!("batch update: {}", targets.join(", ")),
    }
}
