//! Response controller configuration.
//!
//! The defaults mirror the production deployment: a 3 second hard window
//! from the platform, half a second of safety margin to absorb network
//! jitter, and an 800ms tier boundary between a direct reply and a
//! deferral.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing configuration for the response controller.
///
/// All thresholds are compared against elapsed time since the action
/// arrived. `defer_threshold` must sit below `deadline - safety_margin`;
/// [`ResponderConfig::validate`] enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponderConfig {
    /// The hard external window for the first acknowledgment.
    #[serde(with = "duration_millis")]
    pub deadline: Duration,

    /// Margin subtracted from the deadline before any attempt is made.
    /// Past `deadline - safety_margin`, acknowledgment is not attempted.
    #[serde(with = "duration_millis")]
    pub safety_margin: Duration,

    /// Elapsed time past which deferral is chosen over a direct reply.
    #[serde(with = "duration_millis")]
    pub defer_threshold: Duration,

    /// Timeout for the fast operation inside `run_with_budget`.
    #[serde(with = "duration_millis")]
    pub fast_budget: Duration,

    /// Fixed delay before the single retry of a transient update failure.
    #[serde(with = "duration_millis")]
    pub retry_delay: Duration,

    /// How long terminal actions linger in the registry before eviction.
    #[serde(with = "duration_millis")]
    pub eviction_grace: Duration,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_millis(3000),
            safety_margin: Duration::from_millis(500),
            defer_threshold: Duration::from_millis(800),
            fast_budget: Duration::from_millis(2000),
            retry_delay: Duration::from_millis(250),
            eviction_grace: Duration::from_secs(5),
        }
    }
}

impl ResponderConfig {
    /// The elapsed time past which no acknowledgment is attempted.
    #[must_use]
    pub fn expiry_cutoff(&self) -> Duration {
        self.deadline.saturating_sub(self.safety_margin)
    }

    /// Checks internal consistency of the thresholds.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the defer threshold does not sit
    /// below the expiry cutoff, or the fast budget does not fit under the
    /// deadline.
    pub fn validate(&self) -> herald_core::Result<()> {
        if self.defer_threshold >= self.expiry_cutoff() {
            return Err(herald_core::Error::InvalidInput(format!(
                "defer threshold {:?} must be below the expiry cutoff {:?}",
                self.defer_threshold,
                self.expiry_cutoff()
            )));
        }
        if self.fast_budget >= self.deadline {
            return Err(herald_core::Error::InvalidInput(format!(
                "fast budget {:?} must be below the deadline {:?}",
                self.fast_budget, self.deadline
            )));
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
