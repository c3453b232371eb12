//! Persistence queue configuration.
//!
//! The defaults mirror the production deployment: batches of up to five
//! records, a five second age bound on any buffered item, and a one second
//! pause between drains to let further submissions coalesce.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batching and cadence configuration for the commit queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueConfig {
    /// Maximum number of items consumed into one batch.
    pub max_batch_size: usize,

    /// Age past which a buffered item forces the current batch to flush,
    /// bounding worst-case latency for any single submission.
    #[serde(with = "duration_millis")]
    pub max_item_age: Duration,

    /// Pause between a completed drain and the next one when the buffer is
    /// non-empty, so that nearby submissions land in the same batch.
    #[serde(with = "duration_millis")]
    pub redrain_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 5,
            max_item_age: Duration::from_secs(5),
            redrain_delay: Duration::from_secs(1),
        }
    }
}

impl QueueConfig {
    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the batch size is zero.
    pub fn validate(&self) -> herald_core::Result<()> {
        if self.max_batch_size == 0 {
            return Err(herald_core::Error::InvalidInput(
                "max batch size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
