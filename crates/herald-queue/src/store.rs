//! The commit-store contract and its snapshot implementation.
//!
//! The backing store holds one logical record per target plus a commit log,
//! and supports only one writer at a time. Two operations matter to the
//! queue:
//!
//! - **stage**: write a target's record content. Cheap, idempotent,
//!   unconditional - staging the same content twice is harmless.
//! - **commit**: one durable, versioned commit describing every target
//!   touched by the batch, with a human-readable label.
//!
//! [`SnapshotStore`] implements the contract over the
//! [`StorageBackend`](herald_core::StorageBackend) abstraction: the head of
//! the commit log advances with a compare-and-swap precondition, so a lost
//! race surfaces as [`Error::CommitConflict`] instead of a silent overwrite.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use herald_core::{CommitId, StorageBackend, WritePrecondition, WriteResult};

use crate::error::{Error, Result};

/// Storage prefix for target records.
const RECORD_PREFIX: &str = "records";

/// Storage prefix for the commit log.
const COMMIT_PREFIX: &str = "commits";

/// Path of the commit-log head pointer.
const HEAD_PATH: &str = "commits/HEAD";

/// One entry in the commit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Unique, time-sortable commit identifier.
    pub id: CommitId,
    /// Human-readable description of the commit.
    pub label: String,
    /// The distinct targets touched, in first-submission order.
    pub targets: Vec<String>,
    /// When the commit was made durable.
    pub committed_at: DateTime<Utc>,
}

/// The durable write surface the queue drains into.
#[async_trait]
pub trait CommitStore: Send + Sync + 'static {
    /// Stages a target's record content ahead of a commit.
    ///
    /// Idempotent; called once per batch item, before the batch commit.
    async fn stage(&self, target: &str, payload: Bytes) -> Result<()>;

    /// Commits everything staged for the given targets as one versioned
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommitConflict`] when another writer advanced the
    /// store concurrently, and [`Error::CommitIo`] for any other failure.
    async fn commit(&self, targets: &[String], label: &str) -> Result<CommitId>;
}

/// Versioned snapshot store over a [`StorageBackend`].
///
/// Layout: `records/{target}` holds the latest staged content of each
/// target; `commits/{id}` holds one immutable [`CommitRecord`] per commit;
/// `commits/HEAD` holds the latest record and is the serialization point -
/// it only ever advances via CAS.
///
/// The immutable record is written before the head is advanced, so a lost
/// head race can leave an orphaned `commits/{id}` object behind. Orphans
/// are unreferenced and harmless.
#[derive(Clone)]
pub struct SnapshotStore {
    backend: Arc<dyn StorageBackend>,
}

impl SnapshotStore {
    /// Creates a snapshot store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Reads the latest staged content of a target, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails for a reason other than absence.
    pub async fn read_record(&self, target: &str) -> Result<Option<Bytes>> {
        match self.backend.get(&record_path(target)).await {
            Ok(data) => Ok(Some(data)),
            Err(herald_core::Error::NotFound(_)) => Ok(None),
            Err(e) => Err(Error::io_with_source("failed to read record", e)),
        }
    }

    /// Reads the latest commit, if any commit has ever been made.
    ///
    /// # Errors
    ///
    /// Returns an error if the head exists but cannot be read or parsed.
    pub async fn head_commit(&self) -> Result<Option<CommitRecord>> {
        match self.backend.get(HEAD_PATH).await {
            Ok(data) => {
                let record = serde_json::from_slice(&data).map_err(|e| Error::Serialization {
                    message: format!("failed to parse commit head: {e}"),
                })?;
                Ok(Some(record))
            }
            Err(herald_core::Error::NotFound(_)) => Ok(None),
            Err(e) => Err(Error::io_with_source("failed to read commit head", e)),
        }
    }
}

#[async_trait]
impl CommitStore for SnapshotStore {
    #[tracing::instrument(skip(self, payload), fields(record = target, bytes = payload.len()))]
    async fn stage(&self, target: &str, payload: Bytes) -> Result<()> {
        let result = self
            .backend
            .put(&record_path(target), payload, WritePrecondition::None)
            .await
            .map_err(|e| Error::io_with_source("failed to stage record", e))?;

        match result {
            WriteResult::Success { .. } => Ok(()),
            WriteResult::PreconditionFailed { .. } => Err(Error::io(format!(
                "unconditional staging write for {target} reported a precondition failure"
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(targets = targets.len(), label = label))]
    async fn commit(&self, targets: &[String], label: &str) -> Result<CommitId> {
        // The head's current version is the CAS token; absence means this
        // is the first commit ever.
        let precondition = match self
            .backend
            .head(HEAD_PATH)
            .await
            .map_err(|e| Error::io_with_source("failed to read commit head", e))?
        {
            Some(meta) => WritePrecondition::MatchesVersion(meta.version),
            None => WritePrecondition::DoesNotExist,
        };

        let record = CommitRecord {
            id: CommitId::generate(),
            label: label.to_string(),
            targets: targets.to_vec(),
            committed_at: Utc::now(),
        };
        let encoded = serde_json::to_vec(&record).map_err(|e| Error::Serialization {
            message: format!("failed to encode commit record: {e}"),
        })?;
        let encoded = Bytes::from(encoded);

        // Immutable record first; an orphan is harmless, a dangling head
        // reference would not be.
        let result = self
            .backend
            .put(
                &commit_path(record.id),
                encoded.clone(),
                WritePrecondition::DoesNotExist,
            )
            .await
            .map_err(|e| Error::io_with_source("failed to write commit record", e))?;
        if let WriteResult::PreconditionFailed { .. } = result {
            return Err(Error::io(format!(
                "commit record {} already exists",
                record.id
            )));
        }

        let result = self
            .backend
            .put(HEAD_PATH, encoded, precondition)
            .await
            .map_err(|e| Error::io_with_source("failed to advance commit head", e))?;

        match result {
            WriteResult::Success { .. } => {
                tracing::debug!(commit_id = %record.id, "commit head advanced");
                Ok(record.id)
            }
            WriteResult::PreconditionFailed { current_version } => Err(Error::conflict(format!(
                "commit head moved concurrently (version {current_version})"
            ))),
        }
    }
}

fn record_path(target: &str) -> String {
    format!("{RECORD_PREFIX}/{target}")
}

fn commit_path(id: CommitId) -> String {
    format!("{COMMIT_PREFIX}/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::MemoryBackend;

    fn store() -> SnapshotStore {
        SnapshotStore::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn stage_then_commit_roundtrip() {
        let store = store();
        store
            .stage("scoreboard", Bytes::from(r#"{"wins": 3}"#))
            .await
            .unwrap();

        let id = store
            .commit(&["scoreboard".to_string()], "scoreboard update")
            .await
            .unwrap();

        let head = store.head_commit().await.unwrap().expect("head exists");
        assert_eq!(head.id, id);
        assert_eq!(head.label, "scoreboard update");
        assert_eq!(head.targets, vec!["scoreboard".to_string()]);

        let record = store.read_record("scoreboard").await.unwrap().unwrap();
        assert_eq!(record, Bytes::from(r#"{"wins": 3}"#));
    }

    #[tokio::test]
    async fn staging_is_idempotent() {
        let store = store();
        store.stage("config", Bytes::from("a")).await.unwrap();
        store.stage("config", Bytes::from("a")).await.unwrap();
        store.stage("config", Bytes::from("b")).await.unwrap();
        let record = store.read_record("config").await.unwrap().unwrap();
        assert_eq!(record, Bytes::from("b"));
    }

    #[tokio::test]
    async fn sequential_commits_chain() {
        let store = store();
        store.stage("a", Bytes::from("1")).await.unwrap();
        let first = store.commit(&["a".to_string()], "first").await.unwrap();

        store.stage("b", Bytes::from("2")).await.unwrap();
        let second = store.commit(&["b".to_string()], "second").await.unwrap();

        assert_ne!(first, second);
        let head = store.head_commit().await.unwrap().unwrap();
        assert_eq!(head.id, second);
    }

    #[tokio::test]
    async fn stale_head_token_loses_the_race() {
        let backend = Arc::new(MemoryBackend::new());
        let store = SnapshotStore::new(backend.clone());

        store.stage("a", Bytes::from("1")).await.unwrap();
        store.commit(&["a".to_string()], "base").await.unwrap();
        let stale = backend.head(HEAD_PATH).await.unwrap().unwrap().version;

        // Another writer advances the head out from under us.
        store.stage("b", Bytes::from("2")).await.unwrap();
        store.commit(&["b".to_string()], "interloper").await.unwrap();

        // A CAS carrying the stale token must fail, which commit() maps
        // to Error::CommitConflict.
        let result = backend
            .put(
                HEAD_PATH,
                Bytes::from("{}"),
                WritePrecondition::MatchesVersion(stale),
            )
            .await
            .unwrap();
        assert!(matches!(result, WriteResult::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn missing_record_reads_as_none() {
        let store = store();
        assert!(store.read_record("absent").await.unwrap().is_none());
        assert!(store.head_commit().await.unwrap().is_none());
    }
}
