//! Commit-store instrumentation for queue tests.
//!
//! Wraps a real [`CommitStore`] to record every commit, inject scripted
//! failures, and track how many commits are in flight at once - the
//! single-drain guarantee is asserted from that high-water mark.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use herald_core::CommitId;
use herald_queue::error::{Error, Result};
use herald_queue::store::CommitStore;

/// One recorded commit call.
#[derive(Debug, Clone)]
pub struct RecordedCommit {
    /// The distinct targets the commit described.
    pub targets: Vec<String>,
    /// The label the commit carried.
    pub label: String,
}

#[derive(Default)]
struct Plan {
    stage_failures: VecDeque<Error>,
    commit_failures: VecDeque<Error>,
}

/// Instrumented wrapper around a [`CommitStore`].
#[derive(Clone)]
pub struct RecordingCommitStore {
    inner: Arc<dyn CommitStore>,
    commits: Arc<Mutex<Vec<RecordedCommit>>>,
    plan: Arc<Mutex<Plan>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    commit_delay: Option<Duration>,
}

impl RecordingCommitStore {
    /// Wraps the given store.
    #[must_use]
    pub fn new(inner: Arc<dyn CommitStore>) -> Self {
        Self {
            inner,
            commits: Arc::new(Mutex::new(Vec::new())),
            plan: Arc::new(Mutex::new(Plan::default())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            commit_delay: None,
        }
    }

    /// Wraps the given store, holding each commit open for `delay`.
    ///
    /// Widens the window in which overlapping commits would be observable;
    /// under a paused tokio runtime the delay costs no wall time.
    #[must_use]
    pub fn with_commit_delay(inner: Arc<dyn CommitStore>, delay: Duration) -> Self {
        Self {
            commit_delay: Some(delay),
            ..Self::new(inner)
        }
    }

    /// Queues a failure for the next stage call.
    pub fn fail_next_stage(&self, error: Error) {
        self.plan.lock().expect("lock").stage_failures.push_back(error);
    }

    /// Queues a failure for the next commit call.
    pub fn fail_next_commit(&self, error: Error) {
        self.plan.lock().expect("lock").commit_failures.push_back(error);
    }

    /// Returns all recorded commits in order.
    #[must_use]
    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.commits.lock().expect("lock").clone()
    }

    /// Returns the number of commit calls made (including failed ones).
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.lock().expect("lock").len()
    }

    /// Returns the highest number of commits ever in flight at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommitStore for RecordingCommitStore {
    async fn stage(&self, target: &str, payload: Bytes) -> Result<()> {
        let scripted = self.plan.lock().expect("lock").stage_failures.pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }
        self.inner.stage(target, payload).await
    }

    async fn commit(&self, targets: &[String], label: &str) -> Result<CommitId> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }

        self.commits.lock().expect("lock").push(RecordedCommit {
            targets: targets.to_vec(),
            label: label.to_string(),
        });

        let scripted = self.plan.lock().expect("lock").commit_failures.pop_front();
        let result = match scripted {
            Some(error) => Err(error),
            None => self.inner.commit(targets, label).await,
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
